//! In-memory content cache for fetched file bodies
//!
//! Scoped to one analysis session: a new session gets a new, empty cache.
//! Entries are add-only and never refetched once stored. Failed fetches are
//! not stored, so the next request for the same locator tries again.

use crate::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Source of file bodies, keyed by an opaque locator.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch and decode the body behind `locator`.
    async fn fetch_file_content(&self, locator: &str) -> Result<String, FetchError>;
}

/// Memoizes decoded file bodies by locator
pub struct ContentCache {
    fetcher: Arc<dyn ContentFetcher>,
    entries: Mutex<HashMap<String, Arc<str>>>,
}

impl ContentCache {
    pub fn new(fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self {
            fetcher,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the body for `locator`, fetching it on first use.
    ///
    /// Concurrent misses for the same locator may both fetch; the first
    /// stored value wins and every caller receives that value.
    pub async fn get(&self, locator: &str) -> Result<Arc<str>, FetchError> {
        let cached = self.entries().get(locator).cloned();
        if let Some(hit) = cached {
            debug!(locator, "content cache hit");
            return Ok(hit);
        }

        debug!(locator, "content cache miss");
        let body = match self.fetcher.fetch_file_content(locator).await {
            Ok(body) => body,
            Err(err) => {
                warn!(locator, error = %err, "content fetch failed");
                return Err(err);
            }
        };

        let mut entries = self.entries();
        let stored = entries
            .entry(locator.to_string())
            .or_insert_with(|| Arc::from(body));
        Ok(Arc::clone(stored))
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.entries().contains_key(locator)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<str>>> {
        // Writes are single inserts, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
