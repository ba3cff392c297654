//! Fetch transport for schema and catalog sources.
//!
//! The store talks to a [`SchemaFetcher`] trait object rather than to reqwest
//! directly, so tests can substitute a counting mock and cache behavior can be
//! verified without a network.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Fixed timeout for remote fetches. On timeout the store falls back to a
/// stale cache, the same as any other fetch failure.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
}

/// Retrieves the body behind a schema or catalog URL.
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// The production fetcher: `https`/`http` via reqwest with [`FETCH_TIMEOUT`],
/// plus `file://` URLs read from the local filesystem.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("client with a timeout always builds");
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchemaFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(tokio::fs::read_to_string(Path::new(path)).await?);
        }
        if url.starts_with("https://") || url.starts_with("http://") {
            let response = self.client.get(url).send().await?.error_for_status()?;
            return Ok(response.text().await?);
        }
        Err(FetchError::UnsupportedScheme(url.to_string()))
    }
}
