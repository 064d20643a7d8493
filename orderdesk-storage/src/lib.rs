//! Orderdesk Storage - Durable State for the Session Layer
//!
//! Three pieces, leaves first:
//! - [`KeyValueStore`]: string-keyed durable storage with LMDB and in-memory
//!   backends. No business logic.
//! - [`SessionStore`]: the active session slot and the suspended-admin slot
//!   used during impersonation.
//! - [`ReferenceCache`]: reference data stamped with its fetch time and
//!   guarded by a fixed TTL.
//!
//! Persisted records are parsed at this boundary. A record that does not
//! parse is reported as absent, never as a partially-typed value.

pub mod cache;
pub mod session;
pub mod store;

pub use cache::{CacheLookup, CacheRead, ReferenceCache};
pub use session::{SessionStore, StoredSession};
pub use store::{
    KeyValueStore, LmdbStore, MemoryStore, ACTIVE_SESSION_KEY, REFERENCE_CACHE_KEY,
    SUSPENDED_SESSION_KEY,
};
