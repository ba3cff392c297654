//! Test doubles shared by this crate's tests and by downstream crates via the
//! `test-support` feature.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::fetch::{FetchError, SchemaFetcher};

/// In-memory fetcher with a call counter and an offline switch, for asserting
/// exactly when the store reaches for the network.
#[derive(Default)]
pub struct MockFetcher {
    bodies: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "mock fetcher is offline",
            )));
        }
        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| {
                FetchError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no mock body for {url}"),
                ))
            })
    }
}
