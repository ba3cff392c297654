//! Syntax tree types for parsed TOML documents.

pub mod range;
pub mod tree;

pub use range::{Position, Range, SourceLocation};
pub use tree::{Diagnostic, KeyValue, Severity, SyntaxTree, Table, TableKind};
