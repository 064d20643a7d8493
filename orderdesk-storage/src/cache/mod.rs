//! Reference data cache with an explicit freshness contract.
//!
//! The cache stores `{ "data": ReferenceData, "timestamp": epoch-millis }`
//! under a single key. Entries younger than `CACHE_TTL` are served without
//! calling the fetcher; anything older is refetched before it is trusted.
//! There is no path that hands out data past its TTL.
//!
//! # Example
//!
//! ```ignore
//! let read = cache.read(false, || source.fetch_reference_data()).await?;
//! if read.was_cache_hit() {
//!     tracing::debug!(age_secs = read.age_at(clock.now()).as_secs(), "served from cache");
//! }
//! let data = read.into_value();
//! ```

pub mod freshness;
pub mod reference;

pub use freshness::{CacheLookup, CacheRead};
pub use reference::ReferenceCache;
