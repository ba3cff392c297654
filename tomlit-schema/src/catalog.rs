//! Catalog index: glob file-match patterns mapped to schema URLs.
//!
//! The index format follows the JSON Schema Store catalog: a `schemas` array
//! of entries carrying `fileMatch` patterns and a schema `url`. Entries are
//! filtered at load time to the patterns relevant to TOML documents.

use serde::Deserialize;

/// One catalog entry. Only `url` is mandatory in the wire format.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "fileMatch")]
    pub file_match: Vec<String>,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub schemas: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Drop every file-match pattern that does not target a `.toml` file, and
    /// every entry left with no patterns.
    pub fn retain_toml(&mut self) {
        for entry in &mut self.schemas {
            entry
                .file_match
                .retain(|pattern| pattern.to_lowercase().ends_with(".toml"));
        }
        self.schemas.retain(|entry| !entry.file_match.is_empty());
    }

    /// Match a document's file name against the catalog. Both the base name
    /// and the normalized full path (forward slashes) are tried against every
    /// pattern, case-insensitively; the first matching entry wins.
    pub fn schema_url_for(&self, file_name: &str) -> Option<&str> {
        let full = file_name.replace('\\', "/").to_lowercase();
        let base = full.rsplit('/').next().unwrap_or(full.as_str()).to_string();
        for entry in &self.schemas {
            for pattern in &entry.file_match {
                if pattern_matches(&pattern.to_lowercase(), &base, &full) {
                    return Some(&entry.url);
                }
            }
        }
        None
    }
}

/// A malformed glob must not abort matching against the rest of the catalog;
/// it degrades to a literal comparison.
fn pattern_matches(pattern: &str, base: &str, full: &str) -> bool {
    match glob::Pattern::new(pattern) {
        Ok(glob) => glob.matches(base) || glob.matches(full),
        Err(_) => pattern == base || pattern == full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        let mut catalog = Catalog::from_json(
            r#"{
                "schemas": [
                    {
                        "name": "Cargo",
                        "fileMatch": ["Cargo.toml"],
                        "url": "https://example.com/cargo.json"
                    },
                    {
                        "name": "pyproject",
                        "fileMatch": ["*/pyproject.toml", "pyproject.toml"],
                        "url": "https://example.com/pyproject.json"
                    },
                    {
                        "name": "package.json",
                        "fileMatch": ["package.json"],
                        "url": "https://example.com/package.json"
                    }
                ]
            }"#,
        )
        .expect("valid catalog json");
        catalog.retain_toml();
        catalog
    }

    #[test]
    fn non_toml_entries_are_filtered_out() {
        let catalog = sample();
        assert_eq!(catalog.schemas.len(), 2);
        assert!(catalog.schema_url_for("package.json").is_none());
    }

    #[test]
    fn matches_base_name_case_insensitively() {
        let catalog = sample();
        assert_eq!(
            catalog.schema_url_for("/home/dev/project/cargo.TOML"),
            Some("https://example.com/cargo.json")
        );
    }

    #[test]
    fn matches_normalized_full_path() {
        let catalog = sample();
        assert_eq!(
            catalog.schema_url_for("C:\\work\\app\\pyproject.toml"),
            Some("https://example.com/pyproject.json")
        );
    }

    #[test]
    fn unmatched_file_yields_none() {
        assert!(sample().schema_url_for("settings.toml").is_none());
    }

    #[test]
    fn malformed_pattern_falls_back_to_literal_comparison() {
        let mut catalog = Catalog::from_json(
            r#"{
                "schemas": [
                    {"fileMatch": ["[bad.toml"], "url": "https://example.com/bad.json"},
                    {"fileMatch": ["good.toml"], "url": "https://example.com/good.json"}
                ]
            }"#,
        )
        .expect("valid catalog json");
        catalog.retain_toml();
        // The broken glob matches only literally, and does not poison the
        // entries after it.
        assert_eq!(
            catalog.schema_url_for("[bad.toml"),
            Some("https://example.com/bad.json")
        );
        assert_eq!(
            catalog.schema_url_for("good.toml"),
            Some("https://example.com/good.json")
        );
    }
}
