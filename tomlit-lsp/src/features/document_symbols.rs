//! Document outline: tables nested by their dotted names, keys as children.

use lsp_types::SymbolKind;
use tomlit_parser::{Range, SyntaxTree, Table, TableKind};

#[derive(Debug, Clone)]
pub struct TomlDocumentSymbol {
    pub name: String,
    pub detail: Option<String>,
    pub kind: SymbolKind,
    pub range: Range,
    pub selection_range: Range,
    pub children: Vec<TomlDocumentSymbol>,
}

/// Build the outline tree. A table nests under the most recent table whose
/// dotted name is a strict prefix of its own (`[a.b]` under `[a]`); the
/// nested symbol shows only its trailing segments.
pub fn collect_document_symbols(tree: &SyntaxTree) -> Vec<TomlDocumentSymbol> {
    let mut roots: Vec<TomlDocumentSymbol> = tree.root_items.iter().map(key_symbol).collect();
    // Stack of (dotted name, index path into roots) for open table scopes.
    let mut open: Vec<String> = Vec::new();
    for table in &tree.tables {
        while let Some(last) = open.last() {
            if is_parent(last, &table.name) {
                break;
            }
            open.pop();
        }
        let display = match open.last() {
            Some(parent) => table.name[parent.len() + 1..].to_string(),
            None => table.name.clone(),
        };
        let symbol = table_symbol(table, display);
        let slot = nested_slot(&mut roots, open.len());
        slot.push(symbol);
        open.push(table.name.clone());
    }
    roots
}

fn is_parent(parent: &str, child: &str) -> bool {
    child.len() > parent.len()
        && child.starts_with(parent)
        && child.as_bytes()[parent.len()] == b'.'
}

/// Walk down the last-inserted table at each open level to find where the
/// next symbol belongs.
fn nested_slot(roots: &mut Vec<TomlDocumentSymbol>, depth: usize) -> &mut Vec<TomlDocumentSymbol> {
    let mut slot = roots;
    for _ in 0..depth {
        let last = slot
            .iter()
            .rposition(|symbol| symbol.kind != SymbolKind::PROPERTY);
        match last {
            Some(index) => slot = &mut slot[index].children,
            None => break,
        }
    }
    slot
}

fn table_symbol(table: &Table, display: String) -> TomlDocumentSymbol {
    let kind = match table.kind {
        TableKind::Table => SymbolKind::OBJECT,
        TableKind::ArrayOfTables => SymbolKind::ARRAY,
    };
    TomlDocumentSymbol {
        name: display,
        detail: Some(table.name.clone()),
        kind,
        range: table.header_range.clone(),
        selection_range: table.name_range.clone(),
        children: table.items.iter().map(key_symbol).collect(),
    }
}

fn key_symbol(item: &tomlit_parser::KeyValue) -> TomlDocumentSymbol {
    TomlDocumentSymbol {
        name: item.key.clone(),
        detail: None,
        kind: SymbolKind::PROPERTY,
        range: item.key_range.clone(),
        selection_range: item.key_range.clone(),
        children: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tomlit_parser::parse_document;

    const SOURCE: &str = "\
title = \"demo\"

[tool]
flag = true

[tool.poetry]
name = \"pkg\"

[[bin]]
path = \"src/main.rs\"
";

    #[test]
    fn tables_nest_by_dotted_name_with_key_children() {
        let symbols = collect_document_symbols(&parse_document(SOURCE));
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["title", "tool", "bin"]);

        let tool = &symbols[1];
        assert_eq!(tool.kind, SymbolKind::OBJECT);
        let child_names: Vec<&str> = tool.children.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(child_names, ["flag", "poetry"]);
        let poetry = &tool.children[1];
        assert_eq!(poetry.detail.as_deref(), Some("tool.poetry"));
        assert_eq!(poetry.children[0].name, "name");
    }

    #[test]
    fn arrays_of_tables_use_the_array_kind() {
        let symbols = collect_document_symbols(&parse_document(SOURCE));
        let bin = symbols.last().expect("bin symbol");
        assert_eq!(bin.kind, SymbolKind::ARRAY);
        assert_eq!(bin.children[0].name, "path");
    }

    #[test]
    fn sibling_tables_do_not_nest() {
        let source = "[alpha]\n[beta]\n";
        let symbols = collect_document_symbols(&parse_document(source));
        assert_eq!(symbols.len(), 2);
        assert!(symbols.iter().all(|s| s.children.is_empty()));
    }
}
