//! Completion context detection and candidate shaping.
//!
//! Where the cursor sits decides which schema query feeds the list: inside a
//! `[...]`/`[[...]]` header the candidates are whole dotted table paths,
//! after an `=` they are the property's enum values, and anywhere else on a
//! line they are the current table's child keys.

use tomlit_parser::SyntaxTree;
use tomlit_schema::{Completion, PropertyInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    /// Cursor inside an unfinished table header; carries the text typed so
    /// far between the brackets.
    TableHeader { partial: String },
    /// Cursor after `=`; carries the dotted path of the key being assigned.
    Value { path: String },
    /// Cursor on the key side of a line; carries the owning table's path
    /// (empty at document root).
    Key { table_path: String },
}

/// Classify the cursor position from the current line and the last committed
/// tree. The line may be mid-edit and unparseable; only committed *headers*
/// are consulted, to name the owning table.
pub fn completion_context(text: &str, offset: usize, tree: &SyntaxTree) -> CompletionContext {
    let offset = offset.min(text.len());
    let line_start = text[..offset].rfind('\n').map_or(0, |idx| idx + 1);
    let prefix = &text[line_start..offset];
    let trimmed = prefix.trim_start();
    if let Some(inner) = trimmed.strip_prefix('[') {
        let partial = inner.trim_start_matches('[').trim().to_string();
        return CompletionContext::TableHeader { partial };
    }
    let table_path = owning_table(tree, line_start);
    if let Some(key) = prefix.split('=').next().filter(|_| prefix.contains('=')) {
        let key = key.trim();
        let path = if table_path.is_empty() {
            key.to_string()
        } else if key.is_empty() {
            table_path
        } else {
            format!("{table_path}.{key}")
        };
        return CompletionContext::Value { path };
    }
    CompletionContext::Key { table_path }
}

/// A shaped completion entry, converted to the wire type by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    pub label: String,
    pub detail: Option<String>,
    pub documentation: Option<String>,
    pub is_table: bool,
}

pub fn key_candidates(completions: Vec<Completion>) -> Vec<CompletionCandidate> {
    completions
        .into_iter()
        .map(|completion| {
            let mut detail = completion.type_name;
            if completion.deprecated {
                detail = Some(match detail {
                    Some(name) => format!("{name} (deprecated)"),
                    None => "(deprecated)".to_string(),
                });
            }
            CompletionCandidate {
                label: completion.key,
                detail,
                documentation: completion.description,
                is_table: completion.is_table,
            }
        })
        .collect()
}

pub fn value_candidates(info: Option<PropertyInfo>) -> Vec<CompletionCandidate> {
    let Some(info) = info else {
        return Vec::new();
    };
    info.enum_values
        .into_iter()
        .map(|value| CompletionCandidate {
            label: value,
            detail: info.type_name.clone(),
            documentation: None,
            is_table: false,
        })
        .collect()
}

fn owning_table(tree: &SyntaxTree, line_start: usize) -> String {
    tree.tables
        .iter()
        .rev()
        .find(|table| table.header_range.span.start < line_start)
        .map(|table| table.name.clone())
        .unwrap_or_default()
}
