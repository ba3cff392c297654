//! Byte offset to dotted key path resolution.

use tomlit_parser::SyntaxTree;

/// Resolve the key path owning a byte offset.
///
/// Root key-values are scanned first; otherwise the owning table is the last
/// one whose header starts at or before the offset. An offset on the header
/// itself yields the table name, an offset on an item's key *or value* yields
/// the full dotted path, and anything else yields `None` (features that get
/// `None` simply do not participate).
pub fn resolve_key_path(tree: &SyntaxTree, offset: usize) -> Option<String> {
    for item in &tree.root_items {
        if item.key_range.contains_offset(offset) || item.value_range.contains_offset(offset) {
            return Some(item.key.clone());
        }
    }
    let table = tree
        .tables
        .iter()
        .rev()
        .find(|table| table.header_range.span.start <= offset)?;
    if table.header_range.contains_offset(offset) {
        return Some(table.name.clone());
    }
    for item in &table.items {
        if item.key_range.contains_offset(offset) || item.value_range.contains_offset(offset) {
            return Some(format!("{}.{}", table.name, item.key));
        }
    }
    None
}
