//! Freshness metadata for cache reads.

use orderdesk_core::{age, Timestamp};
use std::time::Duration;

/// Result of a cache read, carrying where the value came from and when it
/// was fetched.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    fetched_at: Timestamp,
    was_cache_hit: bool,
}

impl<T> CacheRead<T> {
    /// A value served from a fresh cache entry.
    pub fn from_cache(value: T, fetched_at: Timestamp) -> Self {
        Self {
            value,
            fetched_at,
            was_cache_hit: true,
        }
    }

    /// A value just retrieved from the remote source.
    pub fn from_fetch(value: T, fetched_at: Timestamp) -> Self {
        Self {
            value,
            fetched_at,
            was_cache_hit: false,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }

    /// How old the data is as of `now`.
    pub fn age_at(&self, now: Timestamp) -> Duration {
        age(now, self.fetched_at)
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit
    }
}

/// State of the cache slot without touching the remote source.
#[derive(Debug, Clone)]
pub enum CacheLookup<T> {
    /// Entry within its TTL.
    Fresh(CacheRead<T>),
    /// Entry present but past its TTL; must be refetched before use.
    Stale { fetched_at: Timestamp },
    /// Empty or unparseable slot.
    Missing,
}
