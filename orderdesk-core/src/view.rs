//! Application views and view derivation.

use crate::user::User;
use serde::{Deserialize, Serialize};

/// Top-level screen the application shows. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationView {
    Login,
    RoleSelection,
    AdminDashboard,
    UserJourney,
}

/// Session state machine of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn(User),
    Impersonating { admin: User, target: User },
}

impl SessionState {
    /// The user whose session is active, if any.
    pub fn active_user(&self) -> Option<&User> {
        match self {
            SessionState::LoggedOut => None,
            SessionState::LoggedIn(user) => Some(user),
            SessionState::Impersonating { target, .. } => Some(target),
        }
    }

    pub fn is_impersonating(&self) -> bool {
        matches!(self, SessionState::Impersonating { .. })
    }
}

/// Map a user and the impersonation flag to the view to show.
///
/// Impersonation always lands on the user journey: the observing admin is
/// auditing the end-user path. A system admin with team memberships must pick
/// a role; a pure admin goes straight to the dashboard.
pub fn select_view(user: &User, is_impersonating: bool) -> ApplicationView {
    if is_impersonating {
        ApplicationView::UserJourney
    } else if user.is_system_admin {
        if user.teams().is_empty() {
            ApplicationView::AdminDashboard
        } else {
            ApplicationView::RoleSelection
        }
    } else {
        ApplicationView::UserJourney
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pure_admin_goes_to_dashboard() {
        let user = User::new("root").with_system_admin(true);
        assert_eq!(select_view(&user, false), ApplicationView::AdminDashboard);
    }

    #[test]
    fn test_hybrid_admin_selects_role() {
        let user = User::new("admin1").with_system_admin(true).with_team("Sales,Ops");
        assert_eq!(select_view(&user, false), ApplicationView::RoleSelection);
        assert_eq!(select_view(&user, true), ApplicationView::UserJourney);
    }

    #[test]
    fn test_regular_user_goes_to_journey() {
        let user = User::new("user42").with_team("Sales");
        assert_eq!(select_view(&user, false), ApplicationView::UserJourney);
    }

    #[test]
    fn test_session_state_active_user() {
        let admin = User::new("admin1").with_system_admin(true);
        let target = User::new("user42");
        let state = SessionState::Impersonating {
            admin,
            target: target.clone(),
        };
        assert_eq!(state.active_user(), Some(&target));
        assert!(state.is_impersonating());
        assert_eq!(SessionState::LoggedOut.active_user(), None);
    }

    proptest! {
        #[test]
        fn select_view_is_deterministic(
            is_admin in any::<bool>(),
            team in "[A-Za-z ,]{0,24}",
            impersonating in any::<bool>(),
        ) {
            let user = User::new("someone").with_system_admin(is_admin).with_team(team);
            let first = select_view(&user, impersonating);
            prop_assert_eq!(first, select_view(&user, impersonating));
            if impersonating {
                prop_assert_eq!(first, ApplicationView::UserJourney);
            }
            prop_assert_ne!(first, ApplicationView::Login);
        }
    }
}
