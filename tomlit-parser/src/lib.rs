//! # tomlit-parser
//!
//! Structural parser for TOML documents, built for editor tooling rather than
//! data loading.
//!
//! Two layers cooperate here:
//!
//!     Structural overlay (this crate):
//!         A logos lexer over TOML surface syntax feeds a line-oriented tree
//!         builder. The result is a [`SyntaxTree`](ast::SyntaxTree): the
//!         document's root key-values, its tables and arrays-of-tables with
//!         dotted names, and byte/line/column spans for every key, value and
//!         header. Editor features (outline, hover, completion anchoring,
//!         position-to-path resolution) only ever need this shape, so the
//!         overlay is deliberately forgiving: it never fails, it just records
//!         what it can see.
//!
//!     Full-spec validation (the `toml` crate):
//!         TOML grammar corner cases are not re-implemented. Each parse also
//!         runs the document through the external TOML engine and converts its
//!         error (if any) into a positioned diagnostic on the tree.
//!
//! Trees are immutable once built and rebuilt wholesale on every parse. TOML
//! files are small; full re-parse keeps the model trivially consistent.

pub mod ast;
pub mod lexing;
pub mod parsing;

pub use ast::{
    Diagnostic, KeyValue, Position, Range, Severity, SourceLocation, SyntaxTree, Table, TableKind,
};
pub use parsing::parse_document;
