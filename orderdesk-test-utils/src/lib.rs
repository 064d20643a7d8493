//! Orderdesk Test Utilities
//!
//! Shared test infrastructure for the orderdesk workspace:
//! - Proptest generators for users
//! - Fixture users and reference data for common scenarios
//! - A scripted reference source that counts calls and can be made to fail

pub use orderdesk_core::{
    ApplicationView, Clock, FetchError, ManualClock, OrderdeskError, OrderdeskResult,
    ProfileSink, ProfileUpdate, ReferenceData, ReferenceSource, SessionError, User,
};
pub use orderdesk_storage::MemoryStore;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// SCRIPTED REFERENCE SOURCE
// ============================================================================

#[derive(Debug)]
struct Script {
    data: ReferenceData,
    failure: Option<FetchError>,
    profile_updates: Vec<(String, String)>,
}

/// Reference source returning canned data.
///
/// Every fetch is counted, successful or not. Once [`fail_with`] is set,
/// all subsequent fetches and profile updates fail until [`succeed`] is
/// called. Accepted profile updates are recorded as `(username, full_name)`.
///
/// [`fail_with`]: ScriptedSource::fail_with
/// [`succeed`]: ScriptedSource::succeed
#[derive(Debug)]
pub struct ScriptedSource {
    script: Mutex<Script>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(data: ReferenceData) -> Self {
        Self {
            script: Mutex::new(Script {
                data,
                failure: None,
                profile_updates: Vec::new(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Source that fails every fetch with `error`.
    pub fn failing(error: FetchError) -> Self {
        let source = Self::new(ReferenceData::default());
        source.fail_with(error);
        source
    }

    pub fn set_data(&self, data: ReferenceData) {
        self.script().data = data;
    }

    pub fn fail_with(&self, error: FetchError) {
        self.script().failure = Some(error);
    }

    pub fn succeed(&self) {
        self.script().failure = None;
    }

    pub fn profile_updates(&self) -> Vec<(String, String)> {
        self.script().profile_updates.clone()
    }

    /// Number of fetches issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ReferenceSource for ScriptedSource {
    async fn fetch_reference_data(&self) -> Result<ReferenceData, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script();
        match &script.failure {
            Some(error) => Err(error.clone()),
            None => Ok(script.data.clone()),
        }
    }
}

#[async_trait]
impl ProfileSink for ScriptedSource {
    async fn update_profile(
        &self,
        username: &str,
        update: &ProfileUpdate,
    ) -> Result<(), FetchError> {
        let mut script = self.script();
        if let Some(error) = &script.failure {
            return Err(error.clone());
        }
        script
            .profile_updates
            .push((username.to_string(), update.full_name.clone()));
        Ok(())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating orderdesk identity records.

    use super::*;
    use proptest::prelude::*;

    /// Generate a plausible username.
    pub fn arb_username() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{2,11}"
    }

    /// Generate a comma-separated team list, possibly empty, with stray
    /// whitespace and blank entries mixed in.
    pub fn arb_team_list() -> impl Strategy<Value = String> {
        prop::collection::vec(prop_oneof!["[A-Z][a-z]{2,8}", Just(" ".to_string())], 0..4)
            .prop_map(|teams| teams.join(","))
    }

    /// Generate any user.
    pub fn arb_user() -> impl Strategy<Value = User> {
        (arb_username(), arb_team_list(), any::<bool>()).prop_map(
            |(username, team, is_system_admin)| {
                User::new(username)
                    .with_team(team)
                    .with_system_admin(is_system_admin)
            },
        )
    }

    /// Generate a system administrator, hybrid or pure.
    pub fn arb_admin() -> impl Strategy<Value = User> {
        arb_user().prop_map(|user| user.with_system_admin(true))
    }

    /// Generate a user without administrator rights.
    pub fn arb_non_admin() -> impl Strategy<Value = User> {
        arb_user().prop_map(|user| user.with_system_admin(false))
    }

    /// Generate an `(admin, target)` pair with distinct usernames.
    pub fn arb_admin_and_target() -> impl Strategy<Value = (User, User)> {
        (arb_admin(), arb_user()).prop_map(|(admin, mut target)| {
            if target.username == admin.username {
                target.username.push_str("_t");
            }
            (admin, target)
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built users and reference data.

    use super::*;
    use serde_json::json;

    /// System administrator who is also on the Ops team.
    pub fn hybrid_admin() -> User {
        User::new("admin1")
            .with_full_name("Ada Admin")
            .with_team("Ops")
            .with_role("Manager")
            .with_system_admin(true)
    }

    /// System administrator with no team membership.
    pub fn pure_admin() -> User {
        User::new("root")
            .with_full_name("Root Operator")
            .with_system_admin(true)
    }

    /// Regular seller on a single team.
    pub fn seller() -> User {
        User::new("user42")
            .with_full_name("Dara Sok")
            .with_team("Sales")
            .with_role("Seller")
    }

    /// Regular user on two teams.
    pub fn multi_team_user() -> User {
        User::new("user7")
            .with_full_name("Vy Lim")
            .with_team("Sales, Ops")
            .with_role("Seller")
    }

    /// Reference data holding every fixture user plus a few lookup rows.
    pub fn reference_data() -> ReferenceData {
        let mut data = ReferenceData::default().with_users(vec![
            hybrid_admin(),
            pure_admin(),
            seller(),
            multi_team_user(),
        ]);
        data.teams = vec![json!({"Team": "Sales"}), json!({"Team": "Ops"})];
        data.products = vec![json!({"ProductName": "Jasmine Tea", "Price": 4.5})];
        data.shipping_methods = vec![json!({"MethodName": "Courier"})];
        data
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Orderdesk-specific assertions.

    use super::*;

    /// Assert that a result failed with exactly `expected`.
    pub fn assert_session_error<T: std::fmt::Debug>(
        result: &OrderdeskResult<T>,
        expected: &SessionError,
    ) {
        match result {
            Err(OrderdeskError::Session(actual)) => assert_eq!(actual, expected),
            other => panic!("Expected session error {:?}, got {:?}", expected, other),
        }
    }

    /// Assert that a result is a remote fetch error.
    pub fn assert_fetch_error<T: std::fmt::Debug>(result: &OrderdeskResult<T>) {
        assert!(
            matches!(result, Err(OrderdeskError::Fetch(_))),
            "Expected fetch error, got {:?}",
            result
        );
    }
}
