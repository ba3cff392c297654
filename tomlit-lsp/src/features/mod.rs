//! Stateless feature implementations over the parsed tree and the schema
//! service. Each module returns its own plain result types; the server layer
//! converts them to LSP wire types.

pub mod completion;
pub mod document_symbols;
pub mod hover;
