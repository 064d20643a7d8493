//! Error types for orderdesk operations

use thiserror::Error;

/// Durable key/value backend errors.
///
/// These describe a failing backend, never a malformed record: content that
/// does not parse is reported as absent by the layers above.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Failed to open store at {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Store transaction failed: {reason}")]
    Transaction { reason: String },

    #[error("Failed to encode value for key {key}: {reason}")]
    Encode { key: String, reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Remote record store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("Remote responded with status {status}")]
    Status { status: u16 },

    #[error("Remote rejected request: {message}")]
    Rejected { message: String },

    #[error("Invalid payload from remote: {reason}")]
    InvalidPayload { reason: String },
}

/// Precondition violations on session transitions.
///
/// Returned before any store write is issued, so a rejected call never leaves
/// partial state behind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No user is logged in")]
    NotLoggedIn,

    #[error("User {username} is not a system administrator")]
    NotSystemAdmin { username: String },

    #[error("An impersonation is already in progress for {admin}")]
    AlreadyImpersonating { admin: String },

    #[error("Administrator {username} cannot impersonate themselves")]
    CannotImpersonateSelf { username: String },

    #[error("Unknown user: {username}")]
    UnknownUser { username: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Role selection is not available for {username}")]
    RoleSelectionUnavailable { username: String },

    #[error("User {username} is not a member of team {team}")]
    UnknownTeam { username: String, team: String },

    #[error("Invalid profile update: {reason}")]
    InvalidProfile { reason: String },
}

/// Master error type for all orderdesk errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderdeskError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl OrderdeskError {
    /// True when the error came from the remote record store.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

/// Result type alias for orderdesk operations.
pub type OrderdeskResult<T> = Result<T, OrderdeskError>;

// =============================================================================
// TESTS
// =============================================================================
