//! Schema validation with normalized, editor-friendly violations.
//!
//! The raw validator output is rewritten into a small fixed vocabulary so
//! diagnostics read the same regardless of which keyword fired. Paths are
//! dot-separated to match document key paths; `property` is populated only
//! when the violation names a specific key (missing or unexpected), which is
//! what span anchoring keys off.

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    MissingRequired,
    AdditionalProperty,
    TypeMismatch,
    EnumMismatch,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    /// Dot-separated instance path of the violating node's parent or value.
    pub path: String,
    /// The named key, for violations that single one out.
    pub property: Option<String>,
    pub message: String,
    pub kind: ViolationKind,
}

/// Validate an instance against a schema. A schema that fails to compile
/// produces no violations; remote schemas are not trusted to be well-formed
/// and must never break the document.
pub fn validate(schema: &Value, instance: &Value) -> Vec<SchemaViolation> {
    let compiled = match JSONSchema::compile(schema) {
        Ok(compiled) => compiled,
        Err(error) => {
            debug!(%error, "schema does not compile; skipping validation");
            return Vec::new();
        }
    };
    let Err(errors) = compiled.validate(instance) else {
        return Vec::new();
    };
    let mut violations = Vec::new();
    for error in errors {
        let path = pointer_to_path(&error.instance_path.to_string());
        match &error.kind {
            ValidationErrorKind::Required { property } => {
                let name = value_name(property);
                violations.push(SchemaViolation {
                    path,
                    message: format!("Missing required property '{name}'"),
                    property: Some(name),
                    kind: ViolationKind::MissingRequired,
                });
            }
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                for name in unexpected {
                    violations.push(SchemaViolation {
                        path: path.clone(),
                        message: format!("Unknown property '{name}'"),
                        property: Some(name.clone()),
                        kind: ViolationKind::AdditionalProperty,
                    });
                }
            }
            ValidationErrorKind::Type { kind } => {
                let names = type_names(kind);
                violations.push(SchemaViolation {
                    path,
                    property: None,
                    message: format!("Expected {} {names} value", article(&names)),
                    kind: ViolationKind::TypeMismatch,
                });
            }
            ValidationErrorKind::Enum { .. } => {
                violations.push(SchemaViolation {
                    path,
                    property: None,
                    message: "Value is not one of the allowed values".to_string(),
                    kind: ViolationKind::EnumMismatch,
                });
            }
            _ => {
                violations.push(SchemaViolation {
                    path,
                    property: None,
                    message: error.to_string(),
                    kind: ViolationKind::Other,
                });
            }
        }
    }
    violations
}

/// `/a/b` (optionally `#`-prefixed) becomes `a.b`; the root pointer becomes
/// the empty path.
fn pointer_to_path(pointer: &str) -> String {
    pointer
        .trim_start_matches('#')
        .trim_start_matches('/')
        .replace('/', ".")
}

fn value_name(value: &Value) -> String {
    match value {
        Value::String(name) => name.clone(),
        other => other.to_string(),
    }
}

fn article(name: &str) -> &'static str {
    match name.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

fn type_names(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(primitive) => primitive.to_string(),
        TypeKind::Multiple(primitives) => {
            let names: Vec<String> = primitives
                .into_iter()
                .map(|primitive| primitive.to_string())
                .collect();
            names.join(" or ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_mismatches_report_dotted_paths() {
        let schema = json!({
            "type": "object",
            "properties": {
                "a": { "type": "string" },
                "b": {
                    "type": "object",
                    "properties": {
                        "c": { "type": "integer" }
                    }
                }
            }
        });
        let instance = json!({ "a": 1, "b": { "c": "x" } });
        let mut violations = validate(&schema, &instance);
        violations.sort_by(|x, y| x.path.cmp(&y.path));
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].path, "a");
        assert_eq!(violations[0].kind, ViolationKind::TypeMismatch);
        assert_eq!(violations[0].message, "Expected a string value");
        assert_eq!(violations[1].path, "b.c");
        assert_eq!(violations[1].message, "Expected an integer value");
    }

    #[test]
    fn missing_required_names_the_property_at_the_parent_path() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        let violations = validate(&schema, &json!({}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::MissingRequired);
        assert_eq!(violations[0].path, "");
        assert_eq!(violations[0].property.as_deref(), Some("name"));
        assert_eq!(violations[0].message, "Missing required property 'name'");
    }

    #[test]
    fn unexpected_properties_fan_out_one_violation_each() {
        let schema = json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "dependencies": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {}
                }
            }
        });
        let instance = json!({ "dependencies": { "zap": "1", "zip": "2" } });
        let mut violations = validate(&schema, &instance);
        violations.sort_by(|x, y| x.property.cmp(&y.property));
        assert_eq!(violations.len(), 2);
        for violation in &violations {
            assert_eq!(violation.kind, ViolationKind::AdditionalProperty);
            assert_eq!(violation.path, "dependencies");
        }
        assert_eq!(violations[0].property.as_deref(), Some("zap"));
        assert_eq!(violations[0].message, "Unknown property 'zap'");
        assert_eq!(violations[1].property.as_deref(), Some("zip"));
    }

    #[test]
    fn enum_violations_use_the_fixed_message() {
        let schema = json!({
            "type": "object",
            "properties": {
                "edition": { "enum": ["2018", "2021"] }
            }
        });
        let violations = validate(&schema, &json!({ "edition": "2009" }));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::EnumMismatch);
        assert_eq!(violations[0].path, "edition");
        assert_eq!(violations[0].message, "Value is not one of the allowed values");
    }

    #[test]
    fn multi_type_mismatches_join_the_alternatives() {
        let schema = json!({
            "type": "object",
            "properties": {
                "readme": { "type": ["string", "boolean"] }
            }
        });
        let violations = validate(&schema, &json!({ "readme": 3 }));
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains(" or "));
        assert!(violations[0].message.starts_with("Expected a "));
    }

    #[test]
    fn uncompilable_schema_yields_no_violations() {
        let schema = json!({ "type": 5 });
        assert!(validate(&schema, &json!({})).is_empty());
    }

    #[test]
    fn valid_instance_yields_no_violations() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({ "name": "app" })).is_empty());
    }
}
