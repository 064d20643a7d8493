use orderdesk_client::SessionOrchestrator;
use orderdesk_core::{
    ApplicationView, FetchError, ManualClock, SessionError, SessionState, User, CACHE_TTL,
    SESSION_TTL,
};
use orderdesk_storage::{
    KeyValueStore, LmdbStore, MemoryStore, ACTIVE_SESSION_KEY, REFERENCE_CACHE_KEY,
    SUSPENDED_SESSION_KEY,
};
use orderdesk_test_utils::assertions::{assert_fetch_error, assert_session_error};
use orderdesk_test_utils::fixtures::{hybrid_admin, reference_data, seller};
use orderdesk_test_utils::generators::{arb_admin_and_target, arb_non_admin, arb_user};
use orderdesk_test_utils::ScriptedSource;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime should build")
}

fn source_with(users: Vec<User>) -> Arc<ScriptedSource> {
    Arc::new(ScriptedSource::new(reference_data().with_users(users)))
}

fn assert_all_keys_absent<S: KeyValueStore + ?Sized>(store: &S) {
    for key in [ACTIVE_SESSION_KEY, SUSPENDED_SESSION_KEY, REFERENCE_CACHE_KEY] {
        assert!(
            store.get(key).expect("get should succeed").is_none(),
            "{key} should be absent"
        );
    }
}

#[tokio::test]
async fn hybrid_admin_impersonation_scenario() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::fixed());
    let source = source_with(vec![hybrid_admin(), seller()]);
    let mut desk = SessionOrchestrator::new(store.clone(), clock, source);

    let view = desk.login(hybrid_admin()).await.expect("login should succeed");
    assert_eq!(view, ApplicationView::RoleSelection);

    let view = desk
        .select_role(ApplicationView::AdminDashboard)
        .expect("role selection should succeed");
    assert_eq!(view, ApplicationView::AdminDashboard);

    let view = desk.login_as(seller()).expect("login_as should succeed");
    assert_eq!(view, ApplicationView::UserJourney);
    assert_eq!(desk.suspended_admin().map(|u| u.username.as_str()), Some("admin1"));
    assert!(store.contains_key(SUSPENDED_SESSION_KEY));

    let view = desk.return_to_admin().expect("return should succeed");
    assert_eq!(view, ApplicationView::AdminDashboard);
    assert!(!store.contains_key(SUSPENDED_SESSION_KEY));
    assert_eq!(desk.current_user(), Some(&hybrid_admin()));
    assert!(!desk.is_impersonating());
}

#[tokio::test]
async fn session_survives_restart_on_lmdb() {
    let temp_dir = TempDir::new().expect("TempDir creation should succeed");
    let store = Arc::new(LmdbStore::open(temp_dir.path(), 4).expect("store open should succeed"));
    let clock = Arc::new(ManualClock::fixed());
    let source = source_with(vec![hybrid_admin(), seller()]);

    let mut desk = SessionOrchestrator::new(store.clone(), clock.clone(), source.clone());
    desk.login(hybrid_admin()).await.expect("login should succeed");
    desk.login_as(seller()).expect("login_as should succeed");
    drop(desk);

    clock.advance(Duration::from_secs(600));
    let mut desk = SessionOrchestrator::new(store.clone(), clock, source.clone());
    let view = desk.rehydrate().await.expect("rehydrate should succeed");
    assert_eq!(view, ApplicationView::UserJourney);
    assert_eq!(
        desk.state(),
        &SessionState::Impersonating {
            admin: hybrid_admin(),
            target: seller(),
        }
    );
    assert_eq!(source.calls(), 1);

    desk.logout().expect("logout should succeed");
    assert_all_keys_absent(store.as_ref());
}

#[tokio::test]
async fn dyn_store_and_source() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let source: Arc<dyn orderdesk_core::ReferenceSource> = source_with(vec![seller()]);
    let mut desk = SessionOrchestrator::new(store, Arc::new(ManualClock::fixed()), source);

    let view = desk.login(seller()).await.expect("login should succeed");
    assert_eq!(view, ApplicationView::UserJourney);
}

#[tokio::test]
async fn unreachable_source_leaves_nothing_behind() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(ScriptedSource::failing(FetchError::Transport {
        reason: "connection refused".to_string(),
    }));
    let mut desk = SessionOrchestrator::new(store.clone(), Arc::new(ManualClock::fixed()), source);

    assert_fetch_error(&desk.login(seller()).await);
    assert_eq!(desk.current_view(), ApplicationView::Login);
    assert_all_keys_absent(store.as_ref());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn expired_sessions_never_rehydrate(
        user in arb_user(),
        extra_secs in 1u64..(30 * 24 * 3600),
        impersonate in any::<bool>(),
    ) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::fixed());
        let admin = hybrid_admin().with_team("");
        let source = source_with(vec![admin.clone(), user.clone()]);

        runtime().block_on(async {
            let mut desk = SessionOrchestrator::new(store.clone(), clock.clone(), source.clone());
            if impersonate && user.username != admin.username {
                desk.login(admin.clone()).await.expect("login should succeed");
                desk.login_as(user.clone()).expect("login_as should succeed");
            } else {
                desk.login(user.clone()).await.expect("login should succeed");
            }
        });

        clock.advance(SESSION_TTL + Duration::from_secs(extra_secs));
        let view = runtime().block_on(async {
            let mut desk = SessionOrchestrator::new(store.clone(), clock.clone(), source.clone());
            let view = desk.rehydrate().await.expect("rehydrate should succeed");
            prop_assert_eq!(desk.state(), &SessionState::LoggedOut);
            Ok(view)
        })?;

        prop_assert_eq!(view, ApplicationView::Login);
        prop_assert!(store.is_empty());
    }

    #[test]
    fn impersonation_is_reversible((admin, target) in arb_admin_and_target()) {
        let store = Arc::new(MemoryStore::new());
        let source = source_with(vec![admin.clone(), target.clone()]);

        runtime().block_on(async {
            let mut desk =
                SessionOrchestrator::new(store.clone(), Arc::new(ManualClock::fixed()), source);
            desk.login(admin.clone()).await.expect("login should succeed");
            let before = desk.state().clone();

            desk.login_as(target.clone()).expect("login_as should succeed");
            let view = desk.return_to_admin().expect("return should succeed");

            prop_assert_eq!(desk.state(), &before);
            prop_assert_eq!(view, ApplicationView::AdminDashboard);
            prop_assert!(!store.contains_key(SUSPENDED_SESSION_KEY));
            Ok(())
        })?;
    }

    #[test]
    fn impersonation_never_nests(
        (admin, target) in arb_admin_and_target(),
        other in arb_user(),
    ) {
        let store = Arc::new(MemoryStore::new());
        let source = source_with(vec![admin.clone(), target.clone(), other.clone()]);

        runtime().block_on(async {
            let mut desk =
                SessionOrchestrator::new(store.clone(), Arc::new(ManualClock::fixed()), source);
            desk.login(admin.clone()).await.expect("login should succeed");
            desk.login_as(target.clone()).expect("login_as should succeed");
            let before = desk.state().clone();

            assert_session_error(
                &desk.login_as(other.clone()),
                &SessionError::AlreadyImpersonating {
                    admin: admin.username.clone(),
                },
            );
            prop_assert_eq!(desk.state(), &before);
            Ok(())
        })?;
    }

    #[test]
    fn reads_within_ttl_never_refetch(offset_secs in 0u64..CACHE_TTL.as_secs()) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::fixed());
        let source = source_with(vec![seller()]);

        runtime().block_on(async {
            SessionOrchestrator::new(store.clone(), clock.clone(), source.clone())
                .login(seller())
                .await
                .expect("login should succeed");
        });

        clock.advance(Duration::from_secs(offset_secs));
        runtime().block_on(async {
            SessionOrchestrator::new(store.clone(), clock.clone(), source.clone())
                .rehydrate()
                .await
                .expect("rehydrate should succeed");
        });

        prop_assert_eq!(source.calls(), 1);
    }

    #[test]
    fn non_admins_cannot_impersonate(user in arb_non_admin(), other in arb_user()) {
        let store = Arc::new(MemoryStore::new());
        let source = source_with(vec![user.clone(), other.clone()]);

        runtime().block_on(async {
            let mut desk =
                SessionOrchestrator::new(store.clone(), Arc::new(ManualClock::fixed()), source);
            desk.login(user.clone()).await.expect("login should succeed");

            assert_session_error(
                &desk.login_as(other.clone()),
                &SessionError::NotSystemAdmin {
                    username: user.username.clone(),
                },
            );
            prop_assert_eq!(desk.state(), &SessionState::LoggedIn(user.clone()));
            prop_assert!(!store.contains_key(SUSPENDED_SESSION_KEY));
            Ok(())
        })?;
    }
}
