//! Session orchestration.
//!
//! [`SessionOrchestrator`] owns the in-memory identity and drives every
//! session transition. It is the only writer to the session slots and the
//! reference cache, and callers must not issue a second mutating call while
//! one is in flight.
//!
//! State machine:
//!
//! ```text
//!  LoggedOut ──login──▶ LoggedIn(user) ──login_as──▶ Impersonating(admin, target)
//!      ▲                    │    ▲                          │
//!      └──────logout────────┘    └──────return_to_admin─────┘
//! ```
//!
//! Any remote fetch failure during startup, login or refresh ends the
//! session: there is no degraded view with a session but no data.

use std::sync::Arc;
use std::time::Duration;

use orderdesk_core::{
    select_view, ApplicationView, Clock, OrderdeskError, OrderdeskResult, ProfileSink,
    ProfileUpdate, ReferenceData, ReferenceSource, SessionError, SessionState, User,
};
use orderdesk_storage::{KeyValueStore, ReferenceCache, SessionStore};
use serde::Serialize;

/// Printable snapshot of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub user: Option<String>,
    pub full_name: Option<String>,
    pub suspended_admin: Option<String>,
    pub impersonating: bool,
    pub view: ApplicationView,
    pub active_team: Option<String>,
    pub cached_users: usize,
}

pub struct SessionOrchestrator<S, R>
where
    S: KeyValueStore + ?Sized,
    R: ReferenceSource + ?Sized,
{
    sessions: SessionStore<S>,
    cache: ReferenceCache<S>,
    source: Arc<R>,
    state: SessionState,
    app_data: Option<ReferenceData>,
    view: ApplicationView,
    active_team: Option<String>,
}

impl<S, R> SessionOrchestrator<S, R>
where
    S: KeyValueStore + ?Sized,
    R: ReferenceSource + ?Sized,
{
    /// Create a logged-out orchestrator. Call [`rehydrate`] to restore a
    /// persisted session.
    ///
    /// [`rehydrate`]: SessionOrchestrator::rehydrate
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, source: Arc<R>) -> Self {
        Self {
            sessions: SessionStore::new(Arc::clone(&store), Arc::clone(&clock)),
            cache: ReferenceCache::new(store, clock),
            source,
            state: SessionState::LoggedOut,
            app_data: None,
            view: ApplicationView::Login,
            active_team: None,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.sessions = self.sessions.with_ttl(ttl);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = self.cache.with_ttl(ttl);
        self
    }

    // ------------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_user(&self) -> Option<&User> {
        self.state.active_user()
    }

    pub fn suspended_admin(&self) -> Option<&User> {
        match &self.state {
            SessionState::Impersonating { admin, .. } => Some(admin),
            SessionState::LoggedOut | SessionState::LoggedIn(_) => None,
        }
    }

    pub fn is_impersonating(&self) -> bool {
        self.state.is_impersonating()
    }

    pub fn app_data(&self) -> Option<&ReferenceData> {
        self.app_data.as_ref()
    }

    pub fn current_view(&self) -> ApplicationView {
        self.view
    }

    pub fn active_team(&self) -> Option<&str> {
        self.active_team.as_deref()
    }

    pub fn summary(&self) -> StatusSummary {
        let user = self.current_user();
        StatusSummary {
            user: user.map(|u| u.username.clone()),
            full_name: user.map(|u| u.full_name.clone()),
            suspended_admin: self.suspended_admin().map(|u| u.username.clone()),
            impersonating: self.is_impersonating(),
            view: self.view,
            active_team: self.active_team.clone(),
            cached_users: self.app_data.as_ref().map_or(0, |d| d.users.len()),
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Restore the persisted session at process start.
    ///
    /// An absent or expired active session clears every slot. A suspended
    /// record that does not pair with the active one (not an administrator,
    /// or the same user) is treated as corrupted identity and also clears
    /// everything.
    pub async fn rehydrate(&mut self) -> OrderdeskResult<ApplicationView> {
        let Some(active) = self.sessions.load()? else {
            tracing::info!("No valid session to restore");
            self.logout()?;
            return Ok(self.view);
        };

        let state = match self.sessions.resume_suspended()? {
            None => {
                // An unparseable suspended record reads as absent but still
                // occupies the slot.
                self.sessions.clear_suspended()?;
                SessionState::LoggedIn(active.user)
            }
            Some(suspended) if pairs_with(&suspended.user, &active.user) => {
                SessionState::Impersonating {
                    admin: suspended.user,
                    target: active.user,
                }
            }
            Some(suspended) => {
                tracing::warn!(
                    active = %active.user.username,
                    suspended = %suspended.user.username,
                    "Suspended session does not pair with active session"
                );
                self.logout()?;
                return Ok(self.view);
            }
        };

        let data = match self.fetch_data(false).await {
            Ok(data) => data,
            Err(err) => return Err(self.abandon_session(err)),
        };
        self.app_data = Some(data);
        self.enter(state);

        tracing::info!(
            username = self.current_user().map(|u| u.username.as_str()).unwrap_or_default(),
            impersonating = self.is_impersonating(),
            view = ?self.view,
            "Session restored"
        );
        Ok(self.view)
    }

    /// Start a session for an already-authenticated user.
    pub async fn login(&mut self, user: User) -> OrderdeskResult<ApplicationView> {
        self.sessions.clear_suspended()?;
        self.sessions.save(&user)?;
        tracing::info!(username = %user.username, "User logged in");

        let data = match self.fetch_data(true).await {
            Ok(data) => data,
            Err(err) => return Err(self.abandon_session(err)),
        };
        self.app_data = Some(data);
        self.enter(SessionState::LoggedIn(user));
        Ok(self.view)
    }

    /// End the session from any state. Idempotent.
    pub fn logout(&mut self) -> OrderdeskResult<()> {
        let previous = self.current_user().map(|u| u.username.clone());

        self.state = SessionState::LoggedOut;
        self.app_data = None;
        self.view = ApplicationView::Login;
        self.active_team = None;

        self.sessions.clear_all()?;
        self.cache.invalidate()?;

        if let Some(username) = previous {
            tracing::info!(username, "User logged out");
        }
        Ok(())
    }

    /// Act as `target` while keeping the administrator's session suspended.
    ///
    /// Rejected unless a system administrator is logged in and not already
    /// impersonating. Nothing is written on rejection.
    pub fn login_as(&mut self, target: User) -> OrderdeskResult<ApplicationView> {
        let admin = self.impersonating_admin()?;
        if target.username == admin.username {
            return Err(SessionError::CannotImpersonateSelf {
                username: admin.username,
            }
            .into());
        }

        self.sessions.suspend(&admin)?;
        if let Err(err) = self.sessions.save(&target) {
            if let Err(rollback) = self.sessions.clear_suspended() {
                tracing::warn!(error = %rollback, "Failed to roll back suspended session");
            }
            return Err(err.into());
        }

        tracing::info!(
            admin = %admin.username,
            target = %target.username,
            "Impersonation started"
        );
        self.enter(SessionState::Impersonating { admin, target });
        Ok(self.view)
    }

    /// [`login_as`] with the target looked up in the cached reference data.
    ///
    /// [`login_as`]: SessionOrchestrator::login_as
    pub fn login_as_username(&mut self, username: &str) -> OrderdeskResult<ApplicationView> {
        self.impersonating_admin()?;
        let target = self
            .app_data
            .as_ref()
            .and_then(|data| data.find_user(username))
            .cloned()
            .ok_or_else(|| SessionError::UnknownUser {
                username: username.to_string(),
            })?;
        self.login_as(target)
    }

    /// Reinstate the suspended administrator.
    ///
    /// The suspended record keeps its original issue time. With nothing
    /// coherent to return to, the session is cleared instead.
    pub fn return_to_admin(&mut self) -> OrderdeskResult<ApplicationView> {
        let suspended = match self.sessions.resume_suspended()? {
            Some(suspended) if suspended.user.is_system_admin => suspended,
            Some(suspended) => {
                tracing::warn!(
                    username = %suspended.user.username,
                    "Suspended session is not an administrator, logging out"
                );
                self.logout()?;
                return Ok(self.view);
            }
            None => {
                tracing::warn!("No suspended session to return to, logging out");
                self.logout()?;
                return Ok(self.view);
            }
        };

        self.sessions.reinstate(&suspended)?;
        self.sessions.clear_suspended()?;

        tracing::info!(admin = %suspended.user.username, "Impersonation ended");
        self.state = SessionState::LoggedIn(suspended.user);
        self.set_view(ApplicationView::AdminDashboard);
        Ok(self.view)
    }

    /// Force a reference data refetch.
    pub async fn refresh_data(&mut self) -> OrderdeskResult<()> {
        if self.current_user().is_none() {
            return Err(SessionError::NotLoggedIn.into());
        }
        match self.fetch_data(true).await {
            Ok(data) => {
                self.app_data = Some(data);
                Ok(())
            }
            Err(err) => Err(self.abandon_session(err)),
        }
    }

    /// Leave role selection for the dashboard or the user journey.
    ///
    /// Only a hybrid administrator who is not impersonating has a choice;
    /// they may also switch between the two afterwards.
    pub fn select_role(&mut self, view: ApplicationView) -> OrderdeskResult<ApplicationView> {
        let username = self.hybrid_admin_username()?;
        match view {
            ApplicationView::AdminDashboard | ApplicationView::UserJourney => {
                tracing::info!(username, ?view, "Role selected");
                self.set_view(view);
                Ok(self.view)
            }
            ApplicationView::Login | ApplicationView::RoleSelection => {
                Err(SessionError::RoleSelectionUnavailable { username }.into())
            }
        }
    }

    pub fn back_to_role_selection(&mut self) -> OrderdeskResult<ApplicationView> {
        self.hybrid_admin_username()?;
        self.set_view(ApplicationView::RoleSelection);
        Ok(self.view)
    }

    /// Choose which of the active user's teams the journey runs under.
    pub fn select_team(&mut self, team: &str) -> OrderdeskResult<()> {
        let user = self.current_user().ok_or(SessionError::NotLoggedIn)?;
        if !user.is_member_of(team) {
            return Err(SessionError::UnknownTeam {
                username: user.username.clone(),
                team: team.to_string(),
            }
            .into());
        }
        self.active_team = Some(team.trim().to_string());
        Ok(())
    }

    /// Return to the team choice. A sole team stays selected.
    pub fn clear_team(&mut self) -> OrderdeskResult<()> {
        let user = self.current_user().ok_or(SessionError::NotLoggedIn)?;
        if user.teams().len() > 1 {
            self.active_team = None;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    async fn fetch_data(&self, force_refresh: bool) -> OrderdeskResult<ReferenceData> {
        let read = self
            .cache
            .read(force_refresh, || self.source.fetch_reference_data())
            .await?;
        Ok(read.into_value())
    }

    fn abandon_session(&mut self, err: OrderdeskError) -> OrderdeskError {
        tracing::error!(error = %err, "Reference data unavailable, ending session");
        if let Err(logout_err) = self.logout() {
            tracing::warn!(error = %logout_err, "Failed to clear session after fetch failure");
        }
        err
    }

    fn enter(&mut self, state: SessionState) {
        let view = match state.active_user() {
            Some(user) => select_view(user, state.is_impersonating()),
            None => ApplicationView::Login,
        };
        self.state = state;
        self.set_view(view);
    }

    fn set_view(&mut self, view: ApplicationView) {
        self.view = view;
        self.active_team = match view {
            ApplicationView::UserJourney => self.sole_team(),
            _ => None,
        };
    }

    fn sole_team(&self) -> Option<String> {
        let user = self.current_user()?;
        match user.teams().as_slice() {
            [only] => Some((*only).to_string()),
            _ => None,
        }
    }

    fn impersonating_admin(&self) -> Result<User, SessionError> {
        match &self.state {
            SessionState::LoggedOut => Err(SessionError::NotLoggedIn),
            SessionState::Impersonating { admin, .. } => Err(SessionError::AlreadyImpersonating {
                admin: admin.username.clone(),
            }),
            SessionState::LoggedIn(user) if !user.is_system_admin => {
                Err(SessionError::NotSystemAdmin {
                    username: user.username.clone(),
                })
            }
            SessionState::LoggedIn(user) => Ok(user.clone()),
        }
    }

    fn hybrid_admin_username(&self) -> Result<String, SessionError> {
        match &self.state {
            SessionState::LoggedOut => Err(SessionError::NotLoggedIn),
            SessionState::LoggedIn(user) if user.is_hybrid_admin() => Ok(user.username.clone()),
            SessionState::LoggedIn(user) | SessionState::Impersonating { target: user, .. } => {
                Err(SessionError::RoleSelectionUnavailable {
                    username: user.username.clone(),
                })
            }
        }
    }
}

impl<S, R> SessionOrchestrator<S, R>
where
    S: KeyValueStore + ?Sized,
    R: ReferenceSource + ProfileSink + ?Sized,
{
    /// Submit a profile edit for the active user, then refetch reference
    /// data so the change is visible.
    ///
    /// A rejected edit leaves the session in place; a failed refetch ends it.
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> OrderdeskResult<()> {
        let username = self
            .current_user()
            .map(|u| u.username.clone())
            .ok_or(SessionError::NotLoggedIn)?;
        update.validate()?;
        self.source.update_profile(&username, update).await?;
        self.refresh_data().await
    }
}

fn pairs_with(suspended: &User, active: &User) -> bool {
    suspended.is_system_admin && suspended.username != active.username
}
