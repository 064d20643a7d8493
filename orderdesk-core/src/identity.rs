//! Time types and the clock abstraction.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Maximum age of a persisted session before it is void.
pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Maximum age of cached reference data before it must be refetched.
pub const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Persisted timestamps are epoch milliseconds.
pub fn to_epoch_millis(ts: Timestamp) -> i64 {
    ts.timestamp_millis()
}

/// Returns `None` for millisecond values outside chrono's range.
pub fn from_epoch_millis(millis: i64) -> Option<Timestamp> {
    DateTime::from_timestamp_millis(millis)
}

/// Age of `then` as seen from `now`, clamped at zero for future timestamps.
///
/// If the wall clock steps backwards, records written before the step read
/// as brand new, so sessions and cache entries outlive their TTL by the size
/// of the step.
pub fn age(now: Timestamp, then: Timestamp) -> Duration {
    now.signed_duration_since(then)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

// ============================================================================
// CLOCK ABSTRACTION
// ============================================================================

/// Source of the current time for every TTL decision.
///
/// Injected so session expiry and cache freshness can be tested without
/// sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Settable clock for deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: AtomicI64::new(to_epoch_millis(start)),
        }
    }

    /// 2024-01-01 00:00:00 UTC.
    pub fn fixed() -> Self {
        Self {
            millis: AtomicI64::new(1_704_067_200_000),
        }
    }

    pub fn set(&self, ts: Timestamp) {
        self.millis.store(to_epoch_millis(ts), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let delta = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        from_epoch_millis(self.millis.load(Ordering::SeqCst)).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_constants() {
        assert_eq!(SESSION_TTL.as_secs(), 604_800);
        assert_eq!(CACHE_TTL.as_secs(), 3_600);
    }

    #[test]
    fn test_epoch_millis_round_trip() {
        let clock = ManualClock::fixed();
        let now = clock.now();
        assert_eq!(from_epoch_millis(to_epoch_millis(now)), Some(now));
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::fixed();
        let start = clock.now();
        clock.advance(Duration::from_secs(90));
        assert_eq!(age(clock.now(), start), Duration::from_secs(90));
    }

    #[test]
    fn test_age_of_future_timestamp_is_zero() {
        let clock = ManualClock::fixed();
        let later = clock.now() + chrono::Duration::seconds(30);
        assert_eq!(age(clock.now(), later), Duration::ZERO);
    }
}
