//! brgen core - front end for the brgen binary format language
//!
//! This crate provides:
//! - Lexer: Tokenization of format descriptions
//! - AST: Arena of nodes with owned children and back references
//! - Scope: Branching scope tree for conditional declarations
//! - Parser: Precedence climbing for expressions, indentation blocks for statements
//! - Unions: Struct unions synthesized from `if`/`match` branches

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lexer module - tokenization of brgen source
pub mod lexer;

/// Abstract Syntax Tree - parsed representation of a format description
pub mod ast;

/// Scope tree with `prev`/`branch`/`next` links
pub mod scope;

/// Parser module - converts tokens into a scoped AST
pub mod parser;

/// Located diagnostics and the tolerant-mode reporter
pub mod diagnostic;

/// Parser configuration loaded from `brgen.toml`
pub mod config;

/// Test utilities - helpers for testing parses
pub mod testutil;

/// Convenience re-export of lexer
pub use lexer::Lexer;

/// Convenience re-export of parser
pub use parser::{ParseError, ParseErrorKind, ParseResult, Parser, SyntaxTree};

/// Convenience re-export of configuration
pub use config::{Config, ParseOptions};

/// Convenience re-export of diagnostics
pub use diagnostic::Diagnostic;

/// Parse a whole source file
pub fn parse_source(source: &str, options: &ParseOptions) -> ParseResult<SyntaxTree> {
    Parser::from_source(source, options).parse()
}
