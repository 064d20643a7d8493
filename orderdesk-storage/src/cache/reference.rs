//! TTL-guarded cache for [`ReferenceData`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use orderdesk_core::{
    age, from_epoch_millis, to_epoch_millis, Clock, FetchError, OrderdeskResult, ReferenceData,
    StoreError, Timestamp, CACHE_TTL,
};
use serde::{Deserialize, Serialize};

use super::freshness::{CacheLookup, CacheRead};
use crate::store::{KeyValueStore, REFERENCE_CACHE_KEY};

#[derive(Serialize)]
struct CacheRecordRef<'a> {
    data: &'a ReferenceData,
    timestamp: i64,
}

#[derive(Deserialize)]
struct CacheRecord {
    data: ReferenceData,
    timestamp: i64,
}

/// Single-slot reference data cache.
///
/// Every caller (startup, login, explicit refresh) goes through [`read`],
/// so freshness is decided in exactly one place.
///
/// [`read`]: ReferenceCache::read
pub struct ReferenceCache<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<S: KeyValueStore + ?Sized> ReferenceCache<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ttl: CACHE_TTL,
        }
    }

    /// Override the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Inspect the slot without fetching.
    pub fn lookup(&self) -> Result<CacheLookup<ReferenceData>, StoreError> {
        let Some(raw) = self.store.get(REFERENCE_CACHE_KEY)? else {
            return Ok(CacheLookup::Missing);
        };
        let record = match serde_json::from_str::<CacheRecord>(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed reference cache entry");
                return Ok(CacheLookup::Missing);
            }
        };
        let Some(fetched_at) = from_epoch_millis(record.timestamp) else {
            tracing::warn!(
                timestamp = record.timestamp,
                "Discarding reference cache entry with invalid timestamp"
            );
            return Ok(CacheLookup::Missing);
        };

        if age(self.clock.now(), fetched_at) < self.ttl {
            Ok(CacheLookup::Fresh(CacheRead::from_cache(
                record.data,
                fetched_at,
            )))
        } else {
            Ok(CacheLookup::Stale { fetched_at })
        }
    }

    /// Return reference data, fetching when forced, missing or stale.
    ///
    /// On fetch failure the cached entry is left exactly as it was and the
    /// error is returned unchanged; stale data is never used as a fallback.
    pub async fn read<F, Fut>(
        &self,
        force_refresh: bool,
        fetcher: F,
    ) -> OrderdeskResult<CacheRead<ReferenceData>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ReferenceData, FetchError>>,
    {
        if !force_refresh {
            match self.lookup()? {
                CacheLookup::Fresh(read) => {
                    tracing::debug!(
                        age_secs = read.age_at(self.clock.now()).as_secs(),
                        "Reference cache hit"
                    );
                    return Ok(read);
                }
                CacheLookup::Stale { fetched_at } => {
                    tracing::debug!(%fetched_at, "Reference cache stale, refetching");
                }
                CacheLookup::Missing => {
                    tracing::debug!("Reference cache miss");
                }
            }
        } else {
            tracing::debug!("Reference cache refresh forced");
        }

        let data = fetcher().await?;
        let fetched_at = self.write(&data)?;
        Ok(CacheRead::from_fetch(data, fetched_at))
    }

    /// Overwrite the slot with `data` stamped now.
    pub fn write(&self, data: &ReferenceData) -> Result<Timestamp, StoreError> {
        let fetched_at = self.clock.now();
        let record = CacheRecordRef {
            data,
            timestamp: to_epoch_millis(fetched_at),
        };
        let encoded = serde_json::to_string(&record).map_err(|e| StoreError::Encode {
            key: REFERENCE_CACHE_KEY.to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(REFERENCE_CACHE_KEY, &encoded)?;
        Ok(fetched_at)
    }

    /// Drop the cached entry unconditionally.
    pub fn invalidate(&self) -> Result<(), StoreError> {
        self.store.delete(REFERENCE_CACHE_KEY)
    }
}
