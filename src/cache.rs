//! Response caching for resolver-backed lookups.
//!
//! Caching is namespace-scoped: case metadata, opinion text, and search
//! results age out on different schedules because they change at
//! different rates. Metadata and text for a published opinion are
//! effectively immutable; search results grow as new cases cite old
//! ones.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Cache namespace, determining the entry's time-to-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheNamespace {
    /// Case metadata lookups.
    Metadata,
    /// Full opinion text.
    Text,
    /// Citing-case search pages.
    Search,
}

impl CacheNamespace {
    /// Default time-to-live for this namespace.
    pub fn default_ttl(&self) -> Duration {
        match self {
            Self::Metadata => Duration::from_secs(24 * 60 * 60),
            Self::Text => Duration::from_secs(7 * 24 * 60 * 60),
            Self::Search => Duration::from_secs(3 * 24 * 60 * 60),
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Self::Metadata => "meta",
            Self::Text => "text",
            Self::Search => "search",
        }
    }
}

/// Async cache collaborator for resolver responses.
///
/// Values are stored as plain strings (opinion text, serialized
/// payloads) so implementations can back onto external stores without
/// knowing the payload types.
#[async_trait]
pub trait AnalysisCache: Send + Sync {
    /// Fetch a cached value, `None` on miss or expiry.
    async fn get(&self, namespace: CacheNamespace, key: &str) -> Option<String>;

    /// Store a value under the namespace's TTL.
    async fn set(&self, namespace: CacheNamespace, key: &str, value: String);
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process LRU cache with per-namespace TTLs.
pub struct InMemoryCache {
    entries: Mutex<LruCache<String, Entry>>,
}

impl InMemoryCache {
    /// Create a cache holding up to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn full_key(namespace: CacheNamespace, key: &str) -> String {
        format!("{}:{}", namespace.prefix(), key)
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl AnalysisCache for InMemoryCache {
    async fn get(&self, namespace: CacheNamespace, key: &str) -> Option<String> {
        let full = Self::full_key(namespace, key);
        let mut entries = self.entries.lock();
        match entries.get(&full) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.pop(&full);
                None
            }
            None => None,
        }
    }

    async fn set(&self, namespace: CacheNamespace, key: &str, value: String) {
        let full = Self::full_key(namespace, key);
        let entry = Entry {
            value,
            expires_at: Instant::now() + namespace.default_ttl(),
        };
        self.entries.lock().put(full, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip() {
        let cache = InMemoryCache::new(4);
        cache
            .set(CacheNamespace::Metadata, "410 u.s. 113", "{}".to_string())
            .await;
        assert_eq!(
            cache.get(CacheNamespace::Metadata, "410 u.s. 113").await,
            Some("{}".to_string())
        );
    }

    #[tokio::test]
    async fn test_namespaces_do_not_collide() {
        let cache = InMemoryCache::new(4);
        cache
            .set(CacheNamespace::Metadata, "key", "meta".to_string())
            .await;
        cache
            .set(CacheNamespace::Text, "key", "text".to_string())
            .await;
        assert_eq!(
            cache.get(CacheNamespace::Metadata, "key").await.as_deref(),
            Some("meta")
        );
        assert_eq!(
            cache.get(CacheNamespace::Text, "key").await.as_deref(),
            Some("text")
        );
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = InMemoryCache::new(2);
        cache.set(CacheNamespace::Search, "a", "1".to_string()).await;
        cache.set(CacheNamespace::Search, "b", "2".to_string()).await;
        cache.set(CacheNamespace::Search, "c", "3".to_string()).await;
        assert!(cache.get(CacheNamespace::Search, "a").await.is_none());
        assert!(cache.get(CacheNamespace::Search, "c").await.is_some());
    }

    #[tokio::test]
    async fn test_namespace_ttls_are_tiered() {
        assert!(CacheNamespace::Text.default_ttl() > CacheNamespace::Search.default_ttl());
        assert!(CacheNamespace::Search.default_ttl() > CacheNamespace::Metadata.default_ttl());
    }
}
