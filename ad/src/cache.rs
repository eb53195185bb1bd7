//! Response cache boundary and in-memory TTL implementation
//!
//! Used for idempotency-key replay: the runner checks the cache before
//! any node runs and stores the serialized response afterwards.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tracing::debug;

/// Key/value cache with per-entry TTL
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, ttl: Duration);
}

/// In-process cache backed by a RwLock map
///
/// Expired entries are dropped lazily on read.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        debug!(%key, "MemoryCache::get: called");
        let expired = {
            let entries = self.entries.read().ok()?;
            match entries.get(key) {
                Some((value, expires_at)) => {
                    if Instant::now() < *expires_at {
                        debug!(%key, "get: hit");
                        return Some(value.clone());
                    }
                    true
                }
                None => false,
            }
        };

        if expired
            && let Ok(mut entries) = self.entries.write()
        {
            debug!(%key, "get: dropping expired entry");
            entries.remove(key);
        }
        None
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        debug!(%key, ttl_ms = ttl.as_millis() as u64, "MemoryCache::set: called");
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), (value, Instant::now() + ttl));
        }
    }
}
