use crate::ast::{ASTNode, ImportList, ModuleDef, Stmt};
use crate::diagnostics::{DiagCode, Diagnostic};
use crate::lexer::Token;
use crate::parser::Parser;

use logos::Logos;

use std::collections::{HashMap, HashSet};
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};


/// External collaborator that turns an import path into source text.
/// Paths are resolved against a project root, not the importing file.
pub trait FileResolver {
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Filesystem-backed resolver rooted at the project directory.
pub struct FsResolver {
    root: PathBuf,
}

impl FsResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsResolver { root: root.into() }
    }
}

impl FileResolver for FsResolver {
    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(self.root.join(path))
    }
}

/// In-memory resolver for tests.
#[derive(Default)]
pub struct MapResolver {
    files: HashMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        MapResolver::default()
    }

    pub fn with(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.files.insert(path.into(), source.into());
        self
    }
}

impl FileResolver for MapResolver {
    fn load(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path.to_string_lossy().as_ref())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

/// Merged module-name table. Read-only once import resolution finishes.
#[derive(Debug, Default)]
pub struct ModuleTable {
    modules: HashMap<String, ModuleDef>,
}

impl ModuleTable {
    pub fn get(&self, name: &str) -> Option<&ModuleDef> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// One fully parsed imported file: its own module definitions (exports)
/// plus whether it parsed cleanly.
struct LoadedFile {
    exports: Vec<ModuleDef>,
    clean: bool,
}

/// Builds the merged ModuleTable by walking imports depth-first. A file
/// currently on the walk stack importing itself again is a cycle.
pub struct TableBuilder<'r> {
    resolver: &'r dyn FileResolver,
    table: ModuleTable,
    loading: HashSet<String>,
    loaded: HashMap<String, LoadedFile>,
    pub sources: Vec<(String, String)>,
    pub errors: Vec<Diagnostic>,
}

impl<'r> TableBuilder<'r> {
    pub fn new(resolver: &'r dyn FileResolver) -> Self {
        TableBuilder {
            resolver,
            table: ModuleTable::default(),
            loading: HashSet::new(),
            loaded: HashMap::new(),
            sources: vec![],
            errors: vec![],
        }
    }

    /// Process the entry file's parsed items: registers its module
    /// definitions, resolves its imports, and returns the top-level
    /// statements that form the program body.
    pub fn build(
        mut self,
        entry_file: &str,
        items: Vec<(ASTNode, Range<usize>)>,
    ) -> (ModuleTable, Vec<(Stmt, Range<usize>)>, Vec<Diagnostic>, Vec<(String, String)>) {
        self.loading.insert(entry_file.to_string());
        let mut body = vec![];
        for (node, _) in items {
            match node {
                ASTNode::Module(def) => self.define(def),
                ASTNode::Stmt((Stmt::Import { path, names }, _)) => {
                    self.resolve_import(entry_file, &path, &names);
                }
                ASTNode::Stmt(stmt) => body.push(stmt),
            }
        }
        (self.table, body, self.errors, self.sources)
    }

    fn define(&mut self, def: ModuleDef) {
        match self.table.modules.get(&def.name.0) {
            // the same definition may be reached through two import
            // chains; a second module with the same name elsewhere in the
            // file is still a duplicate, so the name span must match too
            Some(existing) if existing.file == def.file && existing.name.1 == def.name.1 => {}
            Some(existing) => {
                self.errors.push(
                    Diagnostic::error(
                        DiagCode::DuplicateModule,
                        def.file.clone(),
                        def.name.1.clone(),
                        format!(
                            "module '{}' is already defined in {}",
                            def.name.0, existing.file
                        ),
                    ),
                );
            }
            None => {
                self.table.modules.insert(def.name.0.clone(), def);
            }
        }
    }

    fn resolve_import(
        &mut self,
        importing_file: &str,
        path: &(String, Range<usize>),
        names: &ImportList,
    ) {
        if self.loading.contains(&path.0) {
            self.errors.push(Diagnostic::error(
                DiagCode::CyclicImport,
                importing_file.to_string(),
                path.1.clone(),
                format!("import of '{}' forms a cycle", path.0),
            ));
            return;
        }

        if !self.loaded.contains_key(&path.0) {
            self.load_file(importing_file, path);
        }
        let Some(file) = self.loaded.get(&path.0) else {
            return;
        };

        match names {
            ImportList::All => {
                let exports: Vec<ModuleDef> = file.exports.clone();
                for def in exports {
                    self.define(def);
                }
            }
            ImportList::Names(requested) => {
                let clean = file.clean;
                let mut found = vec![];
                let mut missing = vec![];
                for (name, span) in requested {
                    match file.exports.iter().find(|def| &def.name.0 == name) {
                        Some(def) => found.push(def.clone()),
                        None => missing.push((name.clone(), span.clone())),
                    }
                }
                for def in found {
                    self.define(def);
                }
                // a file that failed to parse exports nothing; its syntax
                // errors are already fatal, so skip the cascade
                if clean {
                    for (name, span) in missing {
                        self.errors.push(Diagnostic::error(
                            DiagCode::UnresolvedImport,
                            importing_file.to_string(),
                            span,
                            format!("'{}' is not defined by {}", name, path.0),
                        ));
                    }
                }
            }
        }
    }

    /// Parse one imported file and walk its own imports depth-first.
    fn load_file(&mut self, importing_file: &str, path: &(String, Range<usize>)) {
        let source = match self.resolver.load(Path::new(&path.0)) {
            Ok(source) => source,
            Err(err) => {
                self.errors.push(Diagnostic::error(
                    DiagCode::UnresolvedImport,
                    importing_file.to_string(),
                    path.1.clone(),
                    format!("cannot load '{}': {}", path.0, err),
                ));
                return;
            }
        };
        self.sources.push((path.0.clone(), source.clone()));

        let lexer = Token::lexer(&source).spanned().peekable();
        let mut parser = Parser::new(lexer, path.0.clone());
        let items = parser.parse_program();
        let clean = parser.errors.is_empty();
        self.errors.extend(parser.errors);

        self.loading.insert(path.0.clone());
        let mut exports = vec![];
        for (node, _) in items {
            match node {
                // a broken file contributes no definitions
                ASTNode::Module(def) if clean => exports.push(def),
                ASTNode::Module(_) => {}
                ASTNode::Stmt((Stmt::Import { path: nested, names }, _)) => {
                    self.resolve_import(&path.0, &nested, &names);
                }
                // imported files only contribute module definitions;
                // stray placement statements in them are ignored
                ASTNode::Stmt(_) => {}
            }
        }
        self.loading.remove(&path.0);

        self.loaded
            .insert(path.0.clone(), LoadedFile { exports, clean });
    }
}
