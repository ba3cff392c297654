//! Structural queries against a loaded JSON Schema.
//!
//! Documents address schema nodes by dotted key paths. The walk follows
//! declared `properties`, synthesizes entries from object-valued
//! `additionalProperties` for undeclared segments, resolves local `$ref`
//! pointers, and steps through `items` so array-of-table paths land on the
//! item schema.

use std::sync::Arc;

use serde_json::Value;

/// Hop limit for `$ref` resolution. Catches reference cycles without
/// tracking a visited set.
const MAX_REF_HOPS: usize = 16;

/// Depth limit for whole-schema table walks.
const MAX_TABLE_DEPTH: usize = 12;

/// Whether a property was declared in the schema or synthesized from an
/// `additionalProperties` wildcard. Synthesized properties carry no
/// parent-level metadata, so they are never reported as required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOrigin {
    Declared,
    Synthesized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    /// Last path segment.
    pub name: String,
    /// Full dotted path the info was resolved for.
    pub path: String,
    pub origin: PropertyOrigin,
    pub description: Option<String>,
    pub type_name: Option<String>,
    pub deprecated: bool,
    pub required: bool,
    pub default_text: Option<String>,
    pub enum_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub key: String,
    pub description: Option<String>,
    pub type_name: Option<String>,
    pub deprecated: bool,
    pub is_table: bool,
}

/// A schema rooted at a parsed JSON value, shared with the store's cache.
#[derive(Clone)]
pub struct SchemaDoc {
    root: Arc<Value>,
}

impl SchemaDoc {
    pub fn new(root: Arc<Value>) -> Self {
        Self { root }
    }

    /// Resolve the property a dotted document path addresses.
    pub fn property_info(&self, path: &str) -> Option<PropertyInfo> {
        let mut current = self.container(&self.root);
        let mut resolved: Option<(&Value, PropertyOrigin, bool)> = None;
        for segment in path.split('.') {
            let step = if let Some(child) = current
                .get("properties")
                .and_then(|props| props.get(segment))
            {
                let required = required_by(current, segment);
                (child, PropertyOrigin::Declared, required)
            } else if let Some(extra) = current
                .get("additionalProperties")
                .filter(|extra| extra.is_object())
            {
                (extra, PropertyOrigin::Synthesized, false)
            } else {
                return None;
            };
            current = self.container(step.0);
            resolved = Some(step);
        }
        let (child, origin, required) = resolved?;
        let node = self.deref(child);
        Some(PropertyInfo {
            name: path.rsplit('.').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            origin,
            description: text_field(node, "description"),
            type_name: resolved_type(node),
            deprecated: node
                .get("deprecated")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            required,
            default_text: node.get("default").map(value_text),
            enum_values: enum_values(node),
        })
    }

    /// Immediate child properties of the node at `table_path` (the schema
    /// root when the path is empty).
    pub fn completions(&self, table_path: &str) -> Vec<Completion> {
        let Some(node) = self.node_at(table_path) else {
            return Vec::new();
        };
        let Some(properties) = node.get("properties").and_then(Value::as_object) else {
            return Vec::new();
        };
        let mut completions: Vec<Completion> = properties
            .iter()
            .map(|(key, child)| self.completion(key.clone(), child))
            .collect();
        completions.sort_by(|a, b| a.key.cmp(&b.key));
        completions
    }

    /// Every dotted path in the schema that resolves to a table or an
    /// array-of-tables, filtered by case-insensitive prefix. Backs header
    /// completion, where the candidate list must include nested paths and
    /// not just immediate children.
    pub fn table_completions(&self, partial: &str) -> Vec<Completion> {
        let prefix = partial.to_lowercase();
        let mut completions = Vec::new();
        self.collect_tables(self.container(&self.root), "", 0, &mut completions);
        completions.retain(|completion| completion.key.to_lowercase().starts_with(&prefix));
        completions.sort_by(|a, b| a.key.cmp(&b.key));
        completions
    }

    /// 0-based line of `path`'s final segment in the schema source text.
    /// Scans for each segment's quoted name in order, so nested declarations
    /// are found even when the same property name appears in earlier tables.
    pub fn definition_line(schema_text: &str, path: &str) -> Option<usize> {
        let mut cursor = 0;
        for segment in path.split('.') {
            let needle = format!("\"{segment}\"");
            let found = schema_text[cursor..].find(&needle)?;
            cursor += found + needle.len();
        }
        Some(schema_text[..cursor].matches('\n').count())
    }

    /// Whether the node a document path addresses is table-shaped.
    pub fn is_table_schema(&self, path: &str) -> bool {
        match self.node_at(path) {
            Some(node) => is_object_schema(node),
            None => false,
        }
    }

    fn completion(&self, key: String, child: &Value) -> Completion {
        let node = self.deref(child);
        Completion {
            key,
            description: text_field(node, "description"),
            type_name: resolved_type(node),
            deprecated: node
                .get("deprecated")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            is_table: self.is_table(node),
        }
    }

    fn collect_tables(
        &self,
        node: &Value,
        path: &str,
        depth: usize,
        out: &mut Vec<Completion>,
    ) {
        if depth >= MAX_TABLE_DEPTH {
            return;
        }
        let Some(properties) = node.get("properties").and_then(Value::as_object) else {
            return;
        };
        for (key, child) in properties {
            if !self.is_table(child) {
                continue;
            }
            let child_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };
            out.push(self.completion(child_path.clone(), child));
            self.collect_tables(self.container(child), &child_path, depth + 1, out);
        }
    }

    /// A child counts as a table when it is object-shaped, or an array whose
    /// item schema is an object with declared properties (array-of-tables).
    fn is_table(&self, node: &Value) -> bool {
        let node = self.deref(node);
        if is_object_schema(node) {
            return true;
        }
        if let Some(items) = node.get("items") {
            let items = self.deref(items);
            return is_object_schema(items)
                && items.get("properties").map_or(false, Value::is_object);
        }
        false
    }

    fn node_at(&self, path: &str) -> Option<&Value> {
        let mut current = self.container(&self.root);
        if path.is_empty() {
            return Some(current);
        }
        for segment in path.split('.') {
            let child = if let Some(child) = current
                .get("properties")
                .and_then(|props| props.get(segment))
            {
                child
            } else if let Some(extra) = current
                .get("additionalProperties")
                .filter(|extra| extra.is_object())
            {
                extra
            } else {
                return None;
            };
            current = self.container(child);
        }
        Some(current)
    }

    /// Step into an array's item schema when it is itself addressable, so
    /// `[[bin]]` paths resolve against the element schema.
    fn container<'a>(&'a self, node: &'a Value) -> &'a Value {
        let node = self.deref(node);
        if let Some(items) = node.get("items") {
            let items = self.deref(items);
            if items.get("properties").is_some() || items.get("additionalProperties").is_some() {
                return items;
            }
        }
        node
    }

    /// Follow local `$ref` pointers (`#/...`). Unresolvable or non-local
    /// references leave the node as-is; the walk degrades instead of failing.
    fn deref<'a>(&'a self, mut node: &'a Value) -> &'a Value {
        for _ in 0..MAX_REF_HOPS {
            let Some(reference) = node.get("$ref").and_then(Value::as_str) else {
                return node;
            };
            let Some(pointer) = reference.strip_prefix('#') else {
                return node;
            };
            match self.root.pointer(pointer) {
                Some(target) => node = target,
                None => return node,
            }
        }
        node
    }
}

fn is_object_schema(node: &Value) -> bool {
    node.get("type").and_then(Value::as_str) == Some("object")
        || node.get("properties").map_or(false, Value::is_object)
}

/// Declared `type` (first entry when it is a list) → `"enum"` → `"union"`
/// for `oneOf`/`anyOf` → unknown.
fn resolved_type(node: &Value) -> Option<String> {
    match node.get("type") {
        Some(Value::String(name)) => return Some(name.clone()),
        Some(Value::Array(names)) => {
            if let Some(first) = names.iter().find_map(Value::as_str) {
                return Some(first.to_string());
            }
        }
        _ => {}
    }
    if node.get("enum").map_or(false, Value::is_array) {
        return Some("enum".to_string());
    }
    if node.get("oneOf").is_some() || node.get("anyOf").is_some() {
        return Some("union".to_string());
    }
    None
}

fn required_by(parent: &Value, name: &str) -> bool {
    parent
        .get("required")
        .and_then(Value::as_array)
        .map_or(false, |required| {
            required.iter().any(|entry| entry.as_str() == Some(name))
        })
}

fn text_field(node: &Value, field: &str) -> Option<String> {
    node.get(field).and_then(Value::as_str).map(str::to_string)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn enum_values(node: &Value) -> Vec<String> {
    node.get("enum")
        .and_then(Value::as_array)
        .map(|values| values.iter().map(value_text).collect())
        .unwrap_or_default()
}
