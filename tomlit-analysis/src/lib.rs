//! # tomlit-analysis
//!
//! The per-document analysis pipeline and the editor-facing service facade.
//!
//! A [`document::Document`] owns the parse lifecycle for one open buffer:
//! every edit requests a debounced, cancellable background parse, and the
//! exposed tree is only ever a fully completed parse. Consumers subscribe to
//! a payload-free "parsed" notification and re-read the current tree.
//!
//! On top of the tree, [`position`] maps byte offsets to dotted key paths,
//! [`diagnostics`] anchors schema violations to document spans, and
//! [`service::LanguageService`] ties resolution, querying and validation
//! together for the host.

pub mod diagnostics;
pub mod document;
pub mod position;
pub mod service;

pub use diagnostics::anchor_violations;
pub use document::{Document, DEFAULT_DEBOUNCE};
pub use position::resolve_key_path;
pub use service::LanguageService;
