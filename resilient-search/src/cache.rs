//! In-memory TTL cache for merged search responses.
//!
//! Caches the final deduplicated, ranked [`SearchResponse`] keyed by the
//! (normalised query, kind, results-per-provider) triple. Uses [`moka`] for
//! async-friendly caching with per-entry TTL and bounded capacity.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::Expiry;

use crate::types::{SearchKind, SearchQuery, SearchResponse};

/// Composite cache key: normalised query + kind + requested count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Lowercased, trimmed query string.
    query: String,
    kind: SearchKind,
    results_per_provider: usize,
}

impl CacheKey {
    /// Build a deterministic cache key from a query.
    ///
    /// The query text is lowercased and trimmed so that `"Rust "` and
    /// `"rust"` share an entry.
    pub fn new(query: &SearchQuery) -> Self {
        Self {
            query: query.text().trim().to_lowercase(),
            kind: query.kind(),
            results_per_provider: query.results_per_provider(),
        }
    }
}

#[derive(Clone)]
struct CachedResponse {
    response: Arc<SearchResponse>,
    ttl: Duration,
}

/// Expires each entry after the TTL it was inserted with.
struct PerEntryTtl;

impl Expiry<CacheKey, CachedResponse> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CachedResponse,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &CachedResponse,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Shared response cache, safe to use from concurrent searches.
///
/// Expired entries are never returned: a lookup past an entry's expiry is a
/// miss and the entry is evicted. Writes are best-effort; two searches racing
/// on the same key simply both store, and the later write wins.
#[derive(Clone)]
pub struct ResultCache {
    inner: Cache<CacheKey, CachedResponse>,
}

impl ResultCache {
    /// Create a cache holding at most `max_entries` responses.
    pub fn new(max_entries: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }

    /// Look up a cached response.
    ///
    /// Returns `Some(response)` on hit, `None` on miss or expiry. The
    /// returned response is exactly as stored; callers mark it as cached.
    pub async fn get(&self, key: &CacheKey) -> Option<SearchResponse> {
        self.inner
            .get(key)
            .await
            .map(|entry| entry.response.as_ref().clone())
    }

    /// Store a response for `ttl`. A zero TTL stores nothing.
    pub async fn insert(&self, key: CacheKey, response: SearchResponse, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let entry = CachedResponse {
            response: Arc::new(response),
            ttl,
        };
        self.inner.insert(key, entry).await;
    }

    /// Drop every cached response.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}
