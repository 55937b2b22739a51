use crate::ast::Position;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};

use std::collections::HashMap;
use std::ops::Range;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagCode {
    // syntax-level codes, all fatal
    SyntaxError,
    UnterminatedBlock,
    DuplicateParameter,
    MisplacedControlFlow,
    UnknownKeyword,

    // import resolution, fatal
    DuplicateModule,
    UnresolvedImport,
    CyclicImport,

    // expansion, non-fatal
    UndefinedModule,
    ArgumentMismatch,
    TypeMismatch,
    UnboundName,
    ResourceLimitExceeded,

    // validation, non-fatal
    Collision,
    MissingSupport,
    InvalidAttachment,
    PowerMismatch,
    AssertionFailed,
}

impl DiagCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagCode::SyntaxError => "SyntaxError",
            DiagCode::UnterminatedBlock => "UnterminatedBlock",
            DiagCode::DuplicateParameter => "DuplicateParameter",
            DiagCode::MisplacedControlFlow => "MisplacedControlFlow",
            DiagCode::UnknownKeyword => "UnknownKeyword",
            DiagCode::DuplicateModule => "DuplicateModule",
            DiagCode::UnresolvedImport => "UnresolvedImport",
            DiagCode::CyclicImport => "CyclicImport",
            DiagCode::UndefinedModule => "UndefinedModule",
            DiagCode::ArgumentMismatch => "ArgumentMismatch",
            DiagCode::TypeMismatch => "TypeMismatch",
            DiagCode::UnboundName => "UnboundName",
            DiagCode::ResourceLimitExceeded => "ResourceLimitExceeded",
            DiagCode::Collision => "Collision",
            DiagCode::MissingSupport => "MissingSupport",
            DiagCode::InvalidAttachment => "InvalidAttachment",
            DiagCode::PowerMismatch => "PowerMismatch",
            DiagCode::AssertionFailed => "AssertionFailed",
        }
    }

    /// Fatal codes leave later phases with nothing meaningful to work on,
    /// so a run carrying one produces no placement report.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DiagCode::SyntaxError
                | DiagCode::UnterminatedBlock
                | DiagCode::DuplicateParameter
                | DiagCode::MisplacedControlFlow
                | DiagCode::UnknownKeyword
                | DiagCode::DuplicateModule
                | DiagCode::UnresolvedImport
                | DiagCode::CyclicImport
        )
    }
}

/// One recorded problem. Collected centrally, never raised as control flow.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagCode,
    pub file: String,
    pub span: Range<usize>,
    /// 1-based source line of the span start. Filled in by the aggregator
    /// once it knows the source text; 0 until then.
    pub line: usize,
    pub message: String,
    /// Extra labelled spans in the same file.
    pub labels: Vec<(Range<usize>, String)>,
    pub note: Option<String>,
    /// World positions involved, if any.
    pub positions: Vec<Position>,
    /// Ids of the instances involved, if any.
    pub instances: Vec<usize>,
}

impl Diagnostic {
    pub fn error(code: DiagCode, file: impl Into<String>, span: Range<usize>, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code,
            file: file.into(),
            span,
            line: 0,
            message: message.into(),
            labels: vec![],
            note: None,
            positions: vec![],
            instances: vec![],
        }
    }

    pub fn warning(code: DiagCode, file: impl Into<String>, span: Range<usize>, message: impl Into<String>) -> Self {
        let mut d = Diagnostic::error(code, file, span, message);
        d.severity = Severity::Warning;
        d
    }

    pub fn with_label(mut self, span: Range<usize>, message: impl Into<String>) -> Self {
        self.labels.push((span, message.into()));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_position(mut self, pos: Position) -> Self {
        self.positions.push(pos);
        self
    }

    pub fn with_instance(mut self, id: usize) -> Self {
        self.instances.push(id);
        self
    }

    fn to_report(&self) -> Report<'_, (String, Range<usize>)> {
        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        let mut colors = ColorGenerator::new();
        let mut report = Report::build(kind, (self.file.clone(), self.span.clone()))
            .with_code(self.code.as_str())
            .with_message(&self.message)
            .with_label(
                Label::new((self.file.clone(), self.span.clone()))
                    .with_message(&self.message)
                    .with_color(colors.next()),
            );
        for (span, message) in &self.labels {
            report = report.with_label(
                Label::new((self.file.clone(), span.clone()))
                    .with_message(message)
                    .with_color(colors.next()),
            );
        }
        if let Some(note) = &self.note {
            report = report.with_note(note);
        }
        report.finish()
    }
}

/// Central collector for a whole run. Diagnostics keep the order in which
/// the phases recorded them, so identical inputs print identical output.
#[derive(Debug, Default)]
pub struct Diagnostics {
    sources: HashMap<String, String>,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Register source text so line numbers and reports can be produced
    /// without touching the filesystem again.
    pub fn add_source(&mut self, file: impl Into<String>, text: impl Into<String>) {
        self.sources.insert(file.into(), text.into());
    }

    pub fn push(&mut self, mut diag: Diagnostic) {
        if let Some(src) = self.sources.get(&diag.file) {
            diag.line = line_of(src, diag.span.start);
        }
        self.entries.push(diag);
    }

    pub fn extend(&mut self, diags: impl IntoIterator<Item = Diagnostic>) {
        for diag in diags {
            self.push(diag);
        }
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn has_fatal(&self) -> bool {
        self.entries.iter().any(|d| d.code.is_fatal())
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    /// Pretty-print every collected diagnostic to stderr.
    pub fn print(&self) {
        for diag in &self.entries {
            let source = self
                .sources
                .get(&diag.file)
                .map(|s| Source::from(s.clone()))
                .unwrap_or_else(|| Source::from(String::new()));
            diag.to_report()
                .eprint((diag.file.clone(), source))
                .unwrap_or(());
        }
    }
}

fn line_of(src: &str, offset: usize) -> usize {
    let end = offset.min(src.len());
    src[..end].matches('\n').count() + 1
}
