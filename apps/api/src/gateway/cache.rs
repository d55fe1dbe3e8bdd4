//! Time-windowed in-memory cache of raw provider payloads.
//!
//! Entries are inserted or overwritten, never removed. An entry older than the
//! window is simply ignored on read and replaced by the next successful fetch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::gateway::clock::Clock;
use crate::gateway::transport::RequestDescriptor;

/// Request identity: the fully resolved URL, query string included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn from_request(request: &RequestDescriptor) -> Self {
        Self(request.url.as_str().to_string())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Arc<Value>,
    stored_at: DateTime<Utc>,
}

pub struct ResponseCache {
    window: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the payload stored under `key` if it is younger than the window.
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;

        // A negative age (clock stepped backwards) counts as fresh.
        let age = (now - entry.stored_at).to_std().unwrap_or_default();
        if age < self.window {
            Some(Arc::clone(&entry.payload))
        } else {
            None
        }
    }

    /// Stores `payload` under `key`, replacing whatever was there.
    pub async fn insert(&self, key: CacheKey, payload: Arc<Value>) {
        let entry = CacheEntry {
            payload,
            stored_at: self.clock.now(),
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Number of stored entries, expired ones included.
    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
