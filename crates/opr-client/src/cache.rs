//! Short-lived cache of successful API responses.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default time a cached response stays fresh.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
/// Default upper bound on cached responses.
pub const DEFAULT_MAX_ENTRIES: usize = 256;

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    created_at: Instant,
}

/// Response bodies keyed by request path and query.
///
/// Expired entries are dropped on every access. When full, the oldest entry
/// is evicted to make room.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    max_entries: usize,
    entries: HashMap<String, CacheEntry>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            entries: HashMap::new(),
        }
    }

    /// Builds the cache key for a request.
    pub fn key(path: &str, params: &[(&str, String)]) -> String {
        let mut key = path.to_string();
        for (name, value) in params {
            key.push('&');
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
        key
    }

    pub fn get(&mut self, key: &str) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&mut self, key: String, body: String) {
        self.insert_at(key, body, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_at(&mut self, key: &str, now: Instant) -> Option<String> {
        self.expire(now);
        self.entries.get(key).map(|entry| entry.body.clone())
    }

    fn insert_at(&mut self, key: String, body: String, now: Instant) {
        if self.max_entries == 0 {
            return;
        }
        self.expire(now);
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            if let Some(victim) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(key, _)| key.clone())
            {
                self.entries.remove(&victim);
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                body,
                created_at: now,
            },
        );
    }

    fn expire(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.created_at) <= ttl);
    }
}
