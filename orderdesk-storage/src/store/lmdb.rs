//! LMDB-backed durable store.
//!
//! Uses the heed crate (Rust bindings for LMDB). A single unnamed database
//! holds every key; values are the UTF-8 JSON records written by the layers
//! above.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. Reads use a read transaction, writes and
//! deletes a write transaction committed before returning.

use std::path::Path;

use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions};
use orderdesk_core::StoreError;

use super::KeyValueStore;

fn txn_err(e: heed::Error) -> StoreError {
    StoreError::Transaction {
        reason: e.to_string(),
    }
}

/// LMDB store rooted at a directory.
///
/// # Example
///
/// ```ignore
/// let store = LmdbStore::open("/var/lib/orderdesk", 16)?;
/// store.set("orderAppSession", r#"{"user":{...},"timestamp":1704067200000}"#)?;
/// ```
pub struct LmdbStore {
    env: Env,
    db: Database<Str, Str>,
}

impl LmdbStore {
    /// Open (creating if needed) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the directory cannot be created or the
    /// LMDB environment cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let open_err = |reason: String| StoreError::Open {
            path: path.display().to_string(),
            reason,
        };

        std::fs::create_dir_all(path).map_err(|e| open_err(e.to_string()))?;

        // SAFETY: the environment is opened once per process for this path and
        // never mapped twice by this crate.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path)
        }
        .map_err(|e| open_err(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_err)?;
        let db: Database<Str, Str> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| open_err(e.to_string()))?;
        wtxn.commit().map_err(txn_err)?;

        tracing::debug!(path = %path.display(), max_size_mb, "Opened LMDB store");

        Ok(Self { env, db })
    }
}

impl KeyValueStore for LmdbStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let value = self.db.get(&rtxn, key).map_err(txn_err)?;
        Ok(value.map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db.put(&mut wtxn, key, value).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db.delete(&mut wtxn, key).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)
    }
}
