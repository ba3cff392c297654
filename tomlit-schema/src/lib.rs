//! # tomlit-schema
//!
//! JSON Schema support for TOML documents: resolving which schema applies to a
//! document, fetching and caching schema sources, answering structural
//! questions about a loaded schema, and normalizing validation output.
//!
//! Resolution order is fixed: an in-document `#:schema <url>` directive always
//! wins; otherwise the document's file name is matched against a remotely
//! hosted catalog of glob patterns. Both the catalog index and every schema
//! body are cached on disk with a time-based expiry and degrade to stale
//! copies when the network is unavailable. Every failure mode in this crate
//! collapses to "no schema" — consuming features silently disable themselves
//! rather than surfacing errors to the host.
//!
//! The [`store::SchemaStore`] is an explicitly constructed service (cache
//! directory and fetch transport are injected), so tests get fresh isolated
//! instances instead of sharing process-wide state.

pub mod catalog;
pub mod directive;
pub mod fetch;
pub mod query;
pub mod store;
pub mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use catalog::{Catalog, CatalogEntry};
pub use fetch::{FetchError, HttpFetcher, SchemaFetcher};
pub use query::{Completion, PropertyInfo, PropertyOrigin, SchemaDoc};
pub use store::SchemaStore;
pub use validate::{SchemaViolation, ViolationKind};
