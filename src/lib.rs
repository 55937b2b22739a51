pub mod ast;
pub mod catalog;
pub mod diagnostics;
pub mod engine;
pub mod expand;
pub mod lexer;
pub mod parser;
pub mod table;
pub mod validate;
