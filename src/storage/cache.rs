//! Session-scoped response cache
//!
//! Entries are stored serialized, the way a browser session store holds them,
//! so every read re-validates both the encoding and the expiry. Nothing expires
//! in the background: an entry past its TTL is purged by the read that finds it.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Serialized form of a cached value
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// The cached value
    data: T,
    /// When the value was stored
    #[serde(with = "chrono::serde::ts_milliseconds")]
    stored_at: DateTime<Utc>,
    /// Last instant at which the value may be returned
    #[serde(with = "chrono::serde::ts_milliseconds")]
    expiry: DateTime<Utc>,
}

/// TTL-bounded key/value cache for GET responses
///
/// Keys are logical request paths. Lives as long as its owner (normally one
/// [`ApiClient`](crate::api::ApiClient) and its clones), which plays the role of
/// the application session.
pub struct CacheStore {
    entries: Mutex<HashMap<String, String>>,
    ttl: Duration,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    /// Creates an empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    // Each get/set holds the lock for one synchronous step only, so a
    // poisoned lock still guards a consistent map.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `data` under `key`, replacing any existing entry
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if `data` cannot be serialized
    pub fn set_cache<T: Serialize>(&self, key: &str, data: &T) -> Result<(), serde_json::Error> {
        let stored_at = Utc::now();
        // A TTL past the calendar's end never expires
        let expiry = chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| stored_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let entry = CacheEntry {
            data,
            stored_at,
            expiry,
        };
        let json = serde_json::to_string(&entry)?;

        self.entries().insert(key.to_string(), json);
        debug!(key, ttl_secs = self.ttl.as_secs(), "cache entry stored");
        Ok(())
    }

    /// Returns the cached value for `key` if it has not expired
    ///
    /// Expired and malformed entries are removed and reported as a miss.
    pub fn get_cache<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.entries();
        let raw = entries.get(key)?;

        let entry: CacheEntry<T> = match serde_json::from_str(raw) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(key, error = %err, "discarding malformed cache entry");
                entries.remove(key);
                return None;
            }
        };

        if Utc::now() > entry.expiry {
            debug!(key, stored_at = %entry.stored_at, "cache entry expired");
            entries.remove(key);
            return None;
        }

        Some(entry.data)
    }

    /// Removes the entry for `key`, forcing the next GET to the network
    pub fn clear_cache_item(&self, key: &str) {
        if self.entries().remove(key).is_some() {
            debug!(key, "cache entry invalidated");
        }
    }

    /// Removes every entry
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Number of stored entries, including expired ones not yet read
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
