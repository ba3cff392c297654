//! End-to-end parser tests over realistic documents, plus the determinism
//! and no-panic properties every parse must hold.

use proptest::prelude::*;
use tomlit_parser::{parse_document, Severity, TableKind};

const CARGO_LIKE: &str = r#"# A manifest-shaped document.
[package]
name = "demo"
version = "0.1.0"
edition = "2021"

[dependencies]
serde = { version = "1.0", features = ["derive"] }
tokio = { version = "1", features = [
    "rt",
    "macros",
] }

[dev-dependencies]
tempfile = "3"

[[bin]]
name = "demo"
path = "src/main.rs"

[[bin]]
name = "demo-admin"
path = "src/admin.rs"
"#;

#[test]
fn parses_manifest_shaped_document() {
    let tree = parse_document(CARGO_LIKE);
    assert!(tree.diagnostics.is_empty(), "{:?}", tree.diagnostics);
    assert!(tree.root_items.is_empty());
    let names: Vec<_> = tree.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["package", "dependencies", "dev-dependencies", "bin", "bin"]
    );
    assert!(tree
        .tables
        .iter()
        .filter(|t| t.name == "bin")
        .all(|t| t.kind == TableKind::ArrayOfTables));
}

#[test]
fn inline_table_and_multiline_array_values_are_single_spans() {
    let tree = parse_document(CARGO_LIKE);
    let deps = tree
        .tables
        .iter()
        .find(|t| t.name == "dependencies")
        .expect("dependencies table");
    let serde = &deps.items[0];
    assert_eq!(
        &CARGO_LIKE[serde.value_range.span.clone()],
        r#"{ version = "1.0", features = ["derive"] }"#
    );
    let tokio = &deps.items[1];
    let value = &CARGO_LIKE[tokio.value_range.span.clone()];
    assert!(value.starts_with("{ version"));
    assert!(value.ends_with("] }"));
    assert!(value.contains("\"macros\""));
}

#[test]
fn duplicate_table_is_flagged_by_the_engine() {
    let tree = parse_document("[a]\nx = 1\n[a]\ny = 2\n");
    // Both tables stay in the structural overlay, in document order.
    assert_eq!(tree.tables.len(), 2);
    assert!(tree.has_errors());
}

#[test]
fn unclosed_header_still_records_the_table() {
    let tree = parse_document("[server\nhost = \"x\"\n");
    assert_eq!(tree.tables.len(), 1);
    assert_eq!(tree.tables[0].name, "server");
    assert!(tree.has_errors());
}

#[test]
fn comment_only_document_is_empty_and_clean() {
    let tree = parse_document("# just a comment\n\n# another\n");
    assert!(tree.root_items.is_empty());
    assert!(tree.tables.is_empty());
    assert!(tree.diagnostics.is_empty());
}

#[test]
fn reparse_with_unchanged_text_yields_identical_diagnostics() {
    for source in ["a = 1\n", "a = \n", "[t]\nb = 'x'\n", "= broken"] {
        let first = parse_document(source);
        let second = parse_document(source);
        assert_eq!(first.diagnostics, second.diagnostics);
        assert_eq!(first, second);
    }
}

proptest! {
    #[test]
    fn parse_never_panics(source in "\\PC{0,200}") {
        let _ = parse_document(&source);
    }

    #[test]
    fn parse_is_deterministic(source in "\\PC{0,200}") {
        prop_assert_eq!(parse_document(&source), parse_document(&source));
    }

    #[test]
    fn diagnostics_stay_within_the_document(source in "\\PC{0,200}") {
        let tree = parse_document(&source);
        for diagnostic in &tree.diagnostics {
            prop_assert!(diagnostic.range.span.end <= source.len());
            prop_assert!(diagnostic.severity == Severity::Error);
        }
    }
}
