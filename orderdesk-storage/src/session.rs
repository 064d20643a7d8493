//! Session persistence.
//!
//! Two independent slots on top of a [`KeyValueStore`]:
//! - the active session, which expires `SESSION_TTL` after it was issued;
//! - the suspended administrator session, present only while an
//!   administrator is impersonating another user.
//!
//! Both slots hold `{ "user": User, "timestamp": epoch-millis }`. Missing,
//! unparseable and expired records all read back as `None`; callers cannot
//! and need not tell them apart.

use std::sync::Arc;
use std::time::Duration;

use orderdesk_core::{
    age, from_epoch_millis, to_epoch_millis, Clock, OrderdeskResult, SessionError, StoreError,
    Timestamp, User, SESSION_TTL,
};
use serde::{Deserialize, Serialize};

use crate::store::{KeyValueStore, ACTIVE_SESSION_KEY, SUSPENDED_SESSION_KEY};

/// A `(user, issue time)` pair read from or written to a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub user: User,
    pub issued_at: Timestamp,
}

#[derive(Serialize, Deserialize)]
struct SessionRecord {
    user: User,
    timestamp: i64,
}

impl StoredSession {
    fn encode(&self, key: &str) -> Result<String, StoreError> {
        let record = SessionRecord {
            user: self.user.clone(),
            timestamp: to_epoch_millis(self.issued_at),
        };
        serde_json::to_string(&record).map_err(|e| StoreError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    fn decode(key: &str, raw: &str) -> Option<Self> {
        let record = match serde_json::from_str::<SessionRecord>(raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding malformed session record");
                return None;
            }
        };
        let Some(issued_at) = from_epoch_millis(record.timestamp) else {
            tracing::warn!(
                key,
                timestamp = record.timestamp,
                "Discarding session with invalid timestamp"
            );
            return None;
        };
        Some(Self {
            user: record.user,
            issued_at,
        })
    }
}

/// Active and suspended session slots.
pub struct SessionStore<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<S: KeyValueStore + ?Sized> SessionStore<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ttl: SESSION_TTL,
        }
    }

    /// Override the session lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Write `user` as the active session issued now, replacing any prior one.
    pub fn save(&self, user: &User) -> Result<StoredSession, StoreError> {
        let session = StoredSession {
            user: user.clone(),
            issued_at: self.clock.now(),
        };
        self.write_slot(ACTIVE_SESSION_KEY, &session)?;
        Ok(session)
    }

    /// Write an existing record back as the active session, keeping its
    /// issue time.
    pub fn reinstate(&self, session: &StoredSession) -> Result<(), StoreError> {
        self.write_slot(ACTIVE_SESSION_KEY, session)
    }

    /// Read the active session.
    ///
    /// Returns `None` when the slot is empty, does not parse, or is older
    /// than the TTL. Only backend failures are errors.
    pub fn load(&self) -> Result<Option<StoredSession>, StoreError> {
        let Some(session) = self.read_slot(ACTIVE_SESSION_KEY)? else {
            return Ok(None);
        };
        let session_age = age(self.clock.now(), session.issued_at);
        if session_age > self.ttl {
            tracing::info!(
                username = %session.user.username,
                age_secs = session_age.as_secs(),
                "Active session expired"
            );
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Park `admin` in the suspended slot.
    ///
    /// Fails without writing if a suspended session already exists, so
    /// impersonation can never nest.
    pub fn suspend(&self, admin: &User) -> OrderdeskResult<StoredSession> {
        if let Some(existing) = self.resume_suspended()? {
            return Err(SessionError::AlreadyImpersonating {
                admin: existing.user.username,
            }
            .into());
        }
        let session = StoredSession {
            user: admin.clone(),
            issued_at: self.clock.now(),
        };
        self.write_slot(SUSPENDED_SESSION_KEY, &session)?;
        Ok(session)
    }

    /// Read the suspended slot without clearing it.
    pub fn resume_suspended(&self) -> Result<Option<StoredSession>, StoreError> {
        self.read_slot(SUSPENDED_SESSION_KEY)
    }

    pub fn clear_active(&self) -> Result<(), StoreError> {
        self.store.delete(ACTIVE_SESSION_KEY)
    }

    pub fn clear_suspended(&self) -> Result<(), StoreError> {
        self.store.delete(SUSPENDED_SESSION_KEY)
    }

    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.clear_active()?;
        self.clear_suspended()
    }

    fn write_slot(&self, key: &str, session: &StoredSession) -> Result<(), StoreError> {
        let encoded = session.encode(key)?;
        self.store.set(key, &encoded)
    }

    fn read_slot(&self, key: &str) -> Result<Option<StoredSession>, StoreError> {
        Ok(self
            .store
            .get(key)?
            .and_then(|raw| StoredSession::decode(key, &raw)))
    }
}
