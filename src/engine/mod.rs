use crate::ast::{Facing, Position};
use crate::catalog::{Catalog, ElementType};
use crate::diagnostics::{DiagCode, Diagnostic, Diagnostics};
use crate::expand::Expander;
use crate::lexer::Token;
use crate::parser::Parser;
use crate::table::{FileResolver, TableBuilder};
use crate::validate::{assertion, placement, signal};

use log::{debug, info};
use logos::Logos;

use std::path::Path;


/// Per-run knobs. The entry path is resolved by the engine's resolver,
/// like every import.
pub struct RunOptions {
    pub entry: String,
    pub catalog: Catalog,
    pub max_instances: Option<usize>,
}

impl RunOptions {
    pub fn new(entry: impl Into<String>) -> Self {
        RunOptions {
            entry: entry.into(),
            catalog: Catalog::standard(),
            max_instances: Some(1_000_000),
        }
    }
}

/// One row of the final placement report.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementEntry {
    pub id: usize,
    pub name: String,
    pub element: ElementType,
    pub position: Position,
    pub facing: Option<Facing>,
    pub power: i64,
}

/// Everything a run produced. `placement` is None when a fatal
/// diagnostic left later phases with nothing meaningful to report.
pub struct RunReport {
    pub diagnostics: Diagnostics,
    pub placement: Option<Vec<PlacementEntry>>,
}

impl RunReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Front door of the crate: parse, resolve imports, expand, validate.
/// Identical inputs always produce identical reports.
pub struct Engine<'r> {
    resolver: &'r dyn FileResolver,
}

impl<'r> Engine<'r> {
    pub fn new(resolver: &'r dyn FileResolver) -> Self {
        Engine { resolver }
    }

    pub fn run(&self, options: &RunOptions) -> RunReport {
        let mut diagnostics = Diagnostics::new();

        let source = match self.resolver.load(Path::new(&options.entry)) {
            Ok(source) => source,
            Err(err) => {
                diagnostics.push(Diagnostic::error(
                    DiagCode::UnresolvedImport,
                    options.entry.clone(),
                    0..0,
                    format!("cannot load entry file '{}': {}", options.entry, err),
                ));
                return RunReport {
                    diagnostics,
                    placement: None,
                };
            }
        };
        diagnostics.add_source(options.entry.clone(), source.clone());

        let lexer = Token::lexer(&source).spanned().peekable();
        let mut parser = Parser::new(lexer, options.entry.clone());
        let items = parser.parse_program();
        let parse_errors = std::mem::take(&mut parser.errors);
        diagnostics.extend(parse_errors);

        let builder = TableBuilder::new(self.resolver);
        let (table, body, table_errors, sources) = builder.build(&options.entry, items);
        for (file, text) in sources {
            diagnostics.add_source(file, text);
        }
        diagnostics.extend(table_errors);
        info!(
            "loaded {} modules, {} top-level statements",
            table.len(),
            body.len()
        );

        // syntax or import failures leave no trustworthy program to expand
        if diagnostics.has_fatal() {
            return RunReport {
                diagnostics,
                placement: None,
            };
        }

        let expansion =
            Expander::new(&table, options.max_instances).expand(&body, &options.entry);
        diagnostics.extend(expansion.errors);

        diagnostics.extend(placement::check_placement(&expansion.instances, &options.catalog));
        let (powers, signal_diags) = signal::check_signal(&expansion.instances, &options.catalog);
        diagnostics.extend(signal_diags);
        diagnostics.extend(assertion::check_assertions(
            &expansion.obligations,
            &expansion.instances,
            &powers,
        ));

        let placement = expansion
            .instances
            .iter()
            .map(|inst| PlacementEntry {
                id: inst.id,
                name: inst.scoped_name(),
                element: inst.element,
                position: inst.position,
                facing: inst.facing,
                // conductors report circuit state, everything else what
                // the program declared
                power: powers
                    .get(&inst.id)
                    .copied()
                    .or(inst.power)
                    .unwrap_or(0),
            })
            .collect();
        debug!("run finished with {} diagnostics", diagnostics.entries().len());

        RunReport {
            diagnostics,
            placement: Some(placement),
        }
    }
}
