//! Persistent store adapter.
//!
//! A string-keyed, string-valued durable map. Implementations carry no
//! business logic; the session store and reference cache own the record
//! formats.

pub mod lmdb;
pub mod memory;

pub use lmdb::LmdbStore;
pub use memory::MemoryStore;

use orderdesk_core::StoreError;

/// Key holding the active session record.
pub const ACTIVE_SESSION_KEY: &str = "orderAppSession";

/// Key holding the suspended administrator session during impersonation.
pub const SUSPENDED_SESSION_KEY: &str = "originalAdminSession";

/// Key holding the cached reference data.
pub const REFERENCE_CACHE_KEY: &str = "appDataCache";

/// Durable key/value storage.
///
/// `delete` is idempotent: removing an absent key succeeds.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;
}
