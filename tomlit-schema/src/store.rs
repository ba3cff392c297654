//! The schema store: resolution, fetching, and the two-level cache.
//!
//! One store instance serves every open document in a session. It owns an
//! in-memory schema map, an in-memory URL-to-cache-file map, and a disk cache
//! directory shared across sessions. The catalog index is loaded by a single
//! one-shot task per store; every lookup awaits that load rather than
//! re-triggering it, and a failed load stays failed for the process (degraded
//! mode, no retries).
//!
//! Nothing here returns errors to callers: every failure path degrades to
//! `None`, which consuming features treat as "no schema support for this
//! document".

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::directive;
use crate::fetch::{HttpFetcher, SchemaFetcher};

/// Disk cache entries older than this are re-fetched.
pub const CACHE_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const CATALOG_URL: &str = "https://www.schemastore.org/api/json/catalog.json";
const CATALOG_FILE: &str = "catalog.json";

pub struct SchemaStore {
    cache_dir: PathBuf,
    max_age: Duration,
    fetcher: Arc<dyn SchemaFetcher>,
    /// url -> parsed schema. The lock spans check-then-fetch-then-insert so
    /// the same URL is never downloaded twice concurrently.
    schemas: Mutex<HashMap<String, Arc<Value>>>,
    /// url -> cache file path.
    schema_files: Mutex<HashMap<String, PathBuf>>,
    catalog: OnceCell<Option<Catalog>>,
}

impl SchemaStore {
    pub fn new(cache_dir: impl Into<PathBuf>, fetcher: Arc<dyn SchemaFetcher>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            max_age: CACHE_MAX_AGE,
            fetcher,
            schemas: Mutex::new(HashMap::new()),
            schema_files: Mutex::new(HashMap::new()),
            catalog: OnceCell::new(),
        }
    }

    /// Store backed by the production HTTP fetcher.
    pub fn with_http_cache(cache_dir: impl Into<PathBuf>) -> Self {
        Self::new(cache_dir, Arc::new(HttpFetcher::new()))
    }

    /// Override the cache expiry. Used by tests to force the stale paths.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Resolve the schema URL for a document: the `#:schema` directive first
    /// (it always overrides the catalog), then a catalog match on the file
    /// name.
    pub async fn resolve_schema_url(&self, text: &str, file_name: Option<&str>) -> Option<String> {
        if let Some(url) = directive::schema_directive(text) {
            return Some(url.to_string());
        }
        let file_name = file_name?;
        let catalog = self.catalog().await.as_ref()?;
        catalog.schema_url_for(file_name).map(str::to_string)
    }

    /// The catalog index, loaded at most once per store.
    pub async fn catalog(&self) -> &Option<Catalog> {
        self.catalog.get_or_init(|| self.load_catalog()).await
    }

    async fn load_catalog(&self) -> Option<Catalog> {
        let path = self.cache_dir.join(CATALOG_FILE);
        if self.is_fresh(&path) {
            if let Some(catalog) = read_catalog(&path) {
                return Some(catalog);
            }
        }
        match self.fetcher.fetch(CATALOG_URL).await {
            Ok(body) => match Catalog::from_json(&body) {
                Ok(mut catalog) => {
                    catalog.retain_toml();
                    if let Err(error) = persist(&self.cache_dir, &path, &body) {
                        warn!(%error, "failed to persist catalog cache");
                    }
                    Some(catalog)
                }
                Err(error) => {
                    warn!(%error, "catalog body is not valid json; trying stale cache");
                    read_catalog(&path)
                }
            },
            Err(error) => {
                warn!(%error, "catalog fetch failed; trying stale cache");
                read_catalog(&path)
            }
        }
    }

    /// Resolve a schema URL to a local cache file, fetching if the cached
    /// copy is missing or expired. A failed fetch falls back to a stale copy
    /// when one exists.
    pub async fn get_or_create_cached_schema_file(&self, url: &str) -> Option<PathBuf> {
        let mut files = self.schema_files.lock().await;
        if let Some(path) = files.get(url) {
            if self.is_fresh(path) {
                return Some(path.clone());
            }
        }
        let path = self.cache_dir.join(cache_file_name(url));
        if self.is_fresh(&path) {
            files.insert(url.to_string(), path.clone());
            return Some(path);
        }
        match self.fetcher.fetch(url).await {
            Ok(body) => {
                if let Err(error) = persist(&self.cache_dir, &path, &body) {
                    warn!(%error, url, "failed to persist schema cache");
                    return None;
                }
                files.insert(url.to_string(), path.clone());
                Some(path)
            }
            Err(error) => {
                if path.exists() {
                    debug!(%error, url, "schema fetch failed; using stale cache");
                    files.insert(url.to_string(), path.clone());
                    Some(path)
                } else {
                    warn!(%error, url, "schema fetch failed and no cache exists");
                    None
                }
            }
        }
    }

    /// Load and parse a schema, through the in-memory map first. Malformed
    /// schema JSON is swallowed; diagnostics are best-effort and a broken
    /// remote schema must not break editing.
    pub async fn load_schema(&self, url: &str) -> Option<Arc<Value>> {
        let mut schemas = self.schemas.lock().await;
        if let Some(value) = schemas.get(url) {
            return Some(value.clone());
        }
        let path = self.get_or_create_cached_schema_file(url).await?;
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, url, "failed to read cached schema");
                return None;
            }
        };
        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, url, "cached schema is not valid json");
                return None;
            }
        };
        let value = Arc::new(value);
        schemas.insert(url.to_string(), value.clone());
        Some(value)
    }

    fn is_fresh(&self, path: &Path) -> bool {
        let Ok(metadata) = path.metadata() else {
            return false;
        };
        let Ok(modified) = metadata.modified() else {
            return false;
        };
        match modified.elapsed() {
            Ok(age) => age < self.max_age,
            // A future mtime means the clock moved; treat the file as fresh.
            Err(_) => true,
        }
    }
}

fn read_catalog(path: &Path) -> Option<Catalog> {
    let text = std::fs::read_to_string(path).ok()?;
    let mut catalog = Catalog::from_json(&text).ok()?;
    catalog.retain_toml();
    Some(catalog)
}

fn persist(cache_dir: &Path, path: &Path, body: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(cache_dir)?;
    std::fs::write(path, body)
}

/// Cache file name for a schema URL: the sanitized last path segment, or a
/// hash-derived name when the URL yields nothing usable.
fn cache_file_name(url: &str) -> String {
    let segment = url
        .rsplit('/')
        .next()
        .unwrap_or("")
        .split(['?', '#'])
        .next()
        .unwrap_or("");
    let sanitized: String = segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        let digest = Sha256::digest(url.as_bytes());
        format!("{}.json", hex::encode(&digest[..8]))
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    const CATALOG_BODY: &str = r#"{
        "schemas": [
            {"name": "Cargo", "fileMatch": ["Cargo.toml"], "url": "https://example.com/cargo.json"},
            {"name": "pyproject", "fileMatch": ["*/pyproject.toml"], "url": "https://example.com/pyproject.json"}
        ]
    }"#;

    fn store_with(fetcher: Arc<MockFetcher>, dir: &Path) -> SchemaStore {
        SchemaStore::new(dir, fetcher)
    }

    #[tokio::test]
    async fn directive_overrides_catalog_match() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.insert(CATALOG_URL, CATALOG_BODY);
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with(fetcher, dir.path());

        let text = "#:schema https://example.com/custom.json\n[package]\n";
        let url = store.resolve_schema_url(text, Some("Cargo.toml")).await;
        assert_eq!(url.as_deref(), Some("https://example.com/custom.json"));
    }

    #[tokio::test]
    async fn catalog_matches_when_no_directive() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.insert(CATALOG_URL, CATALOG_BODY);
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with(fetcher, dir.path());

        let url = store
            .resolve_schema_url("[package]\n", Some("/w/app/Cargo.toml"))
            .await;
        assert_eq!(url.as_deref(), Some("https://example.com/cargo.json"));
        let url = store
            .resolve_schema_url("[tool]\n", Some("/w/app/pyproject.toml"))
            .await;
        assert_eq!(url.as_deref(), Some("https://example.com/pyproject.json"));
        assert!(store
            .resolve_schema_url("x = 1\n", Some("settings.toml"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn catalog_loads_once_per_store() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.set_offline(true);
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with(fetcher.clone(), dir.path());

        assert!(store
            .resolve_schema_url("a = 1\n", Some("Cargo.toml"))
            .await
            .is_none());
        assert!(store
            .resolve_schema_url("a = 1\n", Some("Cargo.toml"))
            .await
            .is_none());
        // Degraded mode: the failed load is not retried.
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn cached_schema_round_trip_performs_zero_fetches() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.insert("https://example.com/cargo.json", r#"{"type":"object"}"#);
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with(fetcher.clone(), dir.path());

        let first = store
            .get_or_create_cached_schema_file("https://example.com/cargo.json")
            .await
            .expect("schema file");
        assert_eq!(fetcher.call_count(), 1);

        let second = store
            .get_or_create_cached_schema_file("https://example.com/cargo.json")
            .await
            .expect("schema file");
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(first, second);
        assert_eq!(
            std::fs::read_to_string(&second).expect("cache readable"),
            r#"{"type":"object"}"#
        );
    }

    #[tokio::test]
    async fn fresh_disk_cache_survives_a_new_store_without_fetching() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = "https://example.com/cargo.json";
        {
            let fetcher = Arc::new(MockFetcher::new());
            fetcher.insert(url, "{}");
            let store = store_with(fetcher, dir.path());
            store
                .get_or_create_cached_schema_file(url)
                .await
                .expect("schema file");
        }
        let offline = Arc::new(MockFetcher::new());
        offline.set_offline(true);
        let store = store_with(offline.clone(), dir.path());
        assert!(store.get_or_create_cached_schema_file(url).await.is_some());
        assert_eq!(offline.call_count(), 0);
    }

    #[tokio::test]
    async fn expired_cache_falls_back_to_stale_copy_on_fetch_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = "https://example.com/cargo.json";
        {
            let fetcher = Arc::new(MockFetcher::new());
            fetcher.insert(url, r#"{"stale":true}"#);
            let store = store_with(fetcher, dir.path());
            store
                .get_or_create_cached_schema_file(url)
                .await
                .expect("schema file");
        }
        let offline = Arc::new(MockFetcher::new());
        offline.set_offline(true);
        // Zero max age: everything on disk counts as expired.
        let store = store_with(offline.clone(), dir.path()).with_max_age(Duration::ZERO);
        let path = store
            .get_or_create_cached_schema_file(url)
            .await
            .expect("stale fallback");
        assert_eq!(offline.call_count(), 1);
        assert_eq!(
            std::fs::read_to_string(path).expect("cache readable"),
            r#"{"stale":true}"#
        );
    }

    #[tokio::test]
    async fn stale_catalog_is_used_when_refresh_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let fetcher = Arc::new(MockFetcher::new());
            fetcher.insert(CATALOG_URL, CATALOG_BODY);
            let store = store_with(fetcher, dir.path());
            assert!(store.catalog().await.is_some());
        }
        let offline = Arc::new(MockFetcher::new());
        offline.set_offline(true);
        let store = store_with(offline, dir.path()).with_max_age(Duration::ZERO);
        let url = store
            .resolve_schema_url("[package]\n", Some("Cargo.toml"))
            .await;
        assert_eq!(url.as_deref(), Some("https://example.com/cargo.json"));
    }

    #[tokio::test]
    async fn malformed_cached_schema_degrades_to_none() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.insert("https://example.com/bad.json", "not json at all");
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with(fetcher, dir.path());
        assert!(store.load_schema("https://example.com/bad.json").await.is_none());
    }

    #[tokio::test]
    async fn load_schema_is_memoized_in_memory() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.insert("https://example.com/s.json", r#"{"type":"object"}"#);
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_with(fetcher.clone(), dir.path());

        let first = store
            .load_schema("https://example.com/s.json")
            .await
            .expect("schema");
        let second = store
            .load_schema("https://example.com/s.json")
            .await
            .expect("schema");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.call_count(), 1);
    }

    #[test]
    fn cache_names_derive_from_the_url_segment() {
        assert_eq!(
            cache_file_name("https://example.com/api/cargo.json"),
            "cargo.json"
        );
        assert_eq!(
            cache_file_name("https://example.com/api/json/partial-cargo.json?v=2"),
            "partial-cargo.json"
        );
    }

    #[test]
    fn unusable_segments_fall_back_to_a_hash_name() {
        let name = cache_file_name("https://example.com/");
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), 16 + ".json".len());
        // Deterministic per URL.
        assert_eq!(name, cache_file_name("https://example.com/"));
        assert_ne!(name, cache_file_name("https://example.org/"));
    }
}
