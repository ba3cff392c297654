//! Language Server Protocol front end for the tomlit pipeline.
//!
//! The server layer is deliberately thin: it owns per-document state
//! (current text, the debounced parse lifecycle, a diagnostics watcher task)
//! and translates between LSP wire types and the analysis crates. All
//! feature logic lives in the stateless [`features`] modules, which operate
//! on the parsed tree and the schema service and carry the dense tests;
//! server tests only assert the wiring.
//!
//! Diagnostics are push-based: every completed parse publishes the tree's
//! own syntax diagnostics plus schema violations anchored to document spans.
//! Publishing goes through the [`server::DiagnosticsSink`] trait so tests
//! run against a recording sink instead of a live client.

pub mod features;
pub mod server;

pub use server::TomlLanguageServer;
