//! The collaborator-facing facade over schema resolution and querying.
//!
//! Every operation takes the current document text plus an optional file
//! name and resolves the applicable schema on the fly; the store behind it
//! makes repeat resolution cheap. All failure modes collapse to "no result"
//! so a flaky network or a broken remote schema never breaks editing.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use tomlit_schema::query::SchemaDoc;
use tomlit_schema::{validate, Completion, PropertyInfo, SchemaStore, SchemaViolation};

pub struct LanguageService {
    store: Arc<SchemaStore>,
}

impl LanguageService {
    pub fn new(store: Arc<SchemaStore>) -> Self {
        Self { store }
    }

    pub async fn schema_url(&self, text: &str, file_name: Option<&str>) -> Option<String> {
        self.store.resolve_schema_url(text, file_name).await
    }

    pub async fn has_schema(&self, text: &str, file_name: Option<&str>) -> bool {
        self.schema_url(text, file_name).await.is_some()
    }

    pub async fn property_info(
        &self,
        text: &str,
        file_name: Option<&str>,
        path: &str,
    ) -> Option<PropertyInfo> {
        self.schema_doc(text, file_name).await?.property_info(path)
    }

    pub async fn completions(
        &self,
        text: &str,
        file_name: Option<&str>,
        table_path: &str,
    ) -> Vec<Completion> {
        match self.schema_doc(text, file_name).await {
            Some(doc) => doc.completions(table_path),
            None => Vec::new(),
        }
    }

    pub async fn table_completions(
        &self,
        text: &str,
        file_name: Option<&str>,
        partial: &str,
    ) -> Vec<Completion> {
        match self.schema_doc(text, file_name).await {
            Some(doc) => doc.table_completions(partial),
            None => Vec::new(),
        }
    }

    /// Validate the document against its schema. Schema-less documents are
    /// never flagged; a document the TOML engine cannot evaluate yet (the
    /// parser reports those errors) is skipped for this pass.
    pub async fn validate(&self, text: &str, file_name: Option<&str>) -> Vec<SchemaViolation> {
        let Some(url) = self.schema_url(text, file_name).await else {
            return Vec::new();
        };
        let Some(schema) = self.store.load_schema(&url).await else {
            return Vec::new();
        };
        let table: toml::Table = match text.parse() {
            Ok(table) => table,
            Err(error) => {
                debug!(%error, "document does not evaluate; skipping schema validation");
                return Vec::new();
            }
        };
        let instance = toml_to_json(toml::Value::Table(table));
        validate::validate(&schema, &instance)
    }

    /// Where a property is declared: the cached schema file plus the 0-based
    /// line of the declaration, for go-to-definition.
    pub async fn schema_definition(
        &self,
        text: &str,
        file_name: Option<&str>,
        path: &str,
    ) -> Option<(PathBuf, usize)> {
        let url = self.schema_url(text, file_name).await?;
        let file = self.store.get_or_create_cached_schema_file(&url).await?;
        let schema_text = tokio::fs::read_to_string(&file).await.ok()?;
        let line = SchemaDoc::definition_line(&schema_text, path)?;
        Some((file, line))
    }

    async fn schema_doc(&self, text: &str, file_name: Option<&str>) -> Option<SchemaDoc> {
        let url = self.schema_url(text, file_name).await?;
        let root = self.store.load_schema(&url).await?;
        Some(SchemaDoc::new(root))
    }
}

/// TOML values mapped into plain JSON for the validator. Datetimes become
/// their literal text form; schemas describe them as strings.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(number) => Value::from(number),
        toml::Value::Float(number) => serde_json::Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(flag) => Value::Bool(flag),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}
