//! Anchors schema violations to document spans.

use tomlit_parser::{Diagnostic, Range, Severity, SyntaxTree};
use tomlit_schema::{SchemaViolation, ViolationKind};

/// Turn normalized schema violations into positioned diagnostics.
///
/// Anchor preference, in order: the key span at `path.property`, the key
/// span at `path`, the value span at `path`, and finally the document's
/// first line (a missing required key has no span of its own). Unknown
/// properties are warnings, everything else is an error.
pub fn anchor_violations(tree: &SyntaxTree, violations: &[SchemaViolation]) -> Vec<Diagnostic> {
    violations
        .iter()
        .map(|violation| Diagnostic {
            severity: severity_for(violation.kind),
            message: violation.message.clone(),
            range: anchor(tree, violation),
        })
        .collect()
}

fn severity_for(kind: ViolationKind) -> Severity {
    match kind {
        ViolationKind::AdditionalProperty => Severity::Warning,
        _ => Severity::Error,
    }
}

fn anchor(tree: &SyntaxTree, violation: &SchemaViolation) -> Range {
    if let Some(property) = &violation.property {
        let full = if violation.path.is_empty() {
            property.clone()
        } else {
            format!("{}.{property}", violation.path)
        };
        if let Some(range) = tree.key_range(&full) {
            return range.clone();
        }
    }
    if let Some(range) = tree.key_range(&violation.path) {
        return range.clone();
    }
    if let Some(range) = tree.value_range(&violation.path) {
        return range.clone();
    }
    tree.first_line.clone()
}
