//! The immutable syntax tree built once per parse.

use serde::Serialize;

use super::range::Range;

/// Diagnostic severity. Schema "unknown property" findings are warnings,
/// everything else is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// A positioned message produced during parsing or validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub range: Range,
}

/// Distinguishes `[name]` from `[[name]]` headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableKind {
    Table,
    ArrayOfTables,
}

/// One `key = value` entry. The key is the dotted, unquoted form
/// (`"a".b` becomes `a.b`); spans cover the raw source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub key_range: Range,
    pub value_range: Range,
}

/// A `[table]` or `[[array-of-tables]]` section with its entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Dotted name as written in the header, segments unquoted.
    pub name: String,
    pub kind: TableKind,
    /// The whole header including brackets.
    pub header_range: Range,
    /// Just the dotted name inside the brackets.
    pub name_range: Range,
    pub items: Vec<KeyValue>,
}

/// A parsed document. Constructed fresh on each parse, immutable afterwards,
/// superseded wholesale by the next parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxTree {
    /// Key-values before the first table header.
    pub root_items: Vec<KeyValue>,
    /// Tables in document order.
    pub tables: Vec<Table>,
    /// Syntax problems found while parsing. A tree with diagnostics is still
    /// a valid tree; callers treat it as flagged, not failed.
    pub diagnostics: Vec<Diagnostic>,
    pub text_len: usize,
    /// Span of the first document line, the anchor of last resort.
    pub first_line: Range,
}

impl SyntaxTree {
    /// Find the key span (or table header name span) declared at a dotted
    /// path.
    pub fn key_range(&self, path: &str) -> Option<&Range> {
        if path.is_empty() {
            return None;
        }
        for item in &self.root_items {
            if item.key == path {
                return Some(&item.key_range);
            }
        }
        for table in &self.tables {
            if table.name == path {
                return Some(&table.name_range);
            }
            if let Some(key) = in_table(path, &table.name) {
                for item in &table.items {
                    if item.key == key {
                        return Some(&item.key_range);
                    }
                }
            }
        }
        None
    }

    /// Find the value span of the key declared at a dotted path.
    pub fn value_range(&self, path: &str) -> Option<&Range> {
        if path.is_empty() {
            return None;
        }
        for item in &self.root_items {
            if item.key == path {
                return Some(&item.value_range);
            }
        }
        for table in &self.tables {
            if let Some(key) = in_table(path, &table.name) {
                for item in &table.items {
                    if item.key == key {
                        return Some(&item.value_range);
                    }
                }
            }
        }
        None
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }
}

/// Strip a table-name prefix from a dotted path: `a.b.c` in table `a.b`
/// yields `c`.
fn in_table<'a>(path: &'a str, table_name: &str) -> Option<&'a str> {
    path.strip_prefix(table_name)?.strip_prefix('.')
}
