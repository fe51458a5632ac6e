//! Resolution cache - remembers which infohashes already resolved to a
//! playable URL.
//!
//! An entry is valid for every provider and credential: the same infohash
//! maps to the same publicly cached file no matter whose account triggered
//! the resolution. Entries expire after a TTL and the store is bounded by an
//! LRU policy; stale entries are ignored on read and eventually overwritten
//! or evicted.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics;

/// Default lifetime of a resolved link.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Canonical form of an infohash used as cache key: trimmed and uppercased.
pub fn normalize_hash(hash: &str) -> String {
    hash.trim().to_uppercase()
}

/// A resolved, directly playable URL and when it stops being trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether the entry is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Bounded, TTL-aware map from normalized infohash to playable URL.
///
/// Shared by all concurrent requests; every write replaces the whole entry.
pub struct ResolutionCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    default_ttl: Duration,
}

impl ResolutionCache {
    /// Create an empty cache holding at most `capacity` hashes.
    ///
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            default_ttl,
        }
    }

    /// Lifetime applied by [`ResolutionCache::put_default`].
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up a non-expired entry for `hash`.
    pub fn get(&self, hash: &str) -> Option<CacheEntry> {
        let key = normalize_hash(hash);
        let now = Utc::now();
        let mut entries = self.lock();

        match entries.get(&key) {
            Some(entry) if !entry.is_expired_at(now) => {
                metrics::CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
                Some(entry.clone())
            }
            Some(_) => {
                debug!(hash = %key, "Cache entry expired");
                metrics::CACHE_LOOKUPS.with_label_values(&["expired"]).inc();
                None
            }
            None => {
                metrics::CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
                None
            }
        }
    }

    /// Store `url` for `hash`, valid for `ttl` from now.
    pub fn put(&self, hash: &str, url: impl Into<String>, ttl: Duration) {
        let key = normalize_hash(hash);
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500));
        let entry = CacheEntry {
            url: url.into(),
            expires_at: Utc::now() + ttl,
        };

        debug!(hash = %key, expires_at = %entry.expires_at, "Caching resolved link");
        self.lock().put(key, entry);
    }

    /// Store `url` for `hash` with the cache's default TTL.
    pub fn put_default(&self, hash: &str, url: impl Into<String>) {
        self.put(hash, url, self.default_ttl);
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, CacheEntry>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(10_000, DEFAULT_TTL)
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("len", &self.len())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_hash() {
        assert_eq!(normalize_hash("abc123"), "ABC123");
        assert_eq!(normalize_hash("  AbC123 \n"), "ABC123");
    }

    #[test]
    fn test_put_then_get() {
        let cache = ResolutionCache::default();
        cache.put_default("abc123", "https://dl.example/file.mkv");

        let entry = cache.get("abc123").unwrap();
        assert_eq!(entry.url, "https://dl.example/file.mkv");
        assert!(entry.expires_at > Utc::now());
    }

    #[test]
    fn test_case_and_whitespace_collide() {
        let cache = ResolutionCache::default();
        cache.put_default("abc123", "https://dl.example/a.mp4");

        assert!(cache.get("ABC123 ").is_some());
        assert!(cache.get(" Abc123").is_some());
        assert_eq!(cache.len(), 1);

        // Writing through another spelling overwrites the same entry
        cache.put_default("ABC123", "https://dl.example/b.mp4");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("abc123").unwrap().url, "https://dl.example/b.mp4");
    }

    #[test]
    fn test_expired_entry_is_not_returned() {
        let cache = ResolutionCache::default();
        cache.put("abc123", "https://dl.example/old.mkv", Duration::ZERO);

        assert!(cache.get("abc123").is_none());
        // Stale entries stay until overwritten or evicted
        assert_eq!(cache.len(), 1);

        cache.put_default("abc123", "https://dl.example/new.mkv");
        assert_eq!(cache.get("abc123").unwrap().url, "https://dl.example/new.mkv");
    }

    #[test]
    fn test_missing_entry() {
        let cache = ResolutionCache::default();
        assert!(cache.get("deadbeef").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_bound_evicts_least_recently_used() {
        let cache = ResolutionCache::new(2, DEFAULT_TTL);
        cache.put_default("aaa", "https://dl.example/a");
        cache.put_default("bbb", "https://dl.example/b");

        // Touch "aaa" so "bbb" becomes least recently used
        assert!(cache.get("aaa").is_some());
        cache.put_default("ccc", "https://dl.example/c");

        assert_eq!(cache.len(), 2);
        assert!(cache.get("aaa").is_some());
        assert!(cache.get("bbb").is_none());
        assert!(cache.get("ccc").is_some());
    }

    #[test]
    fn test_zero_capacity_is_bumped() {
        let cache = ResolutionCache::new(0, DEFAULT_TTL);
        cache.put_default("aaa", "https://dl.example/a");
        assert_eq!(cache.get("aaa").unwrap().url, "https://dl.example/a");
    }

    #[test]
    fn test_cache_entry_expiry_check() {
        let now = Utc::now();
        let entry = CacheEntry {
            url: "u".to_string(),
            expires_at: now,
        };
        assert!(entry.is_expired_at(now));
        assert!(!entry.is_expired_at(now - chrono::Duration::seconds(1)));
    }
}
