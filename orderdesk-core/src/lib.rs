//! Orderdesk Core - Session Types
//!
//! Pure data structures shared by every other crate: the user record, the
//! reference data aggregate, the application views and the error hierarchy.
//! The only logic here is `select_view`, which is a pure function.

pub mod error;
pub mod identity;
pub mod profile;
pub mod reference;
pub mod source;
pub mod user;
pub mod view;

pub use error::{FetchError, OrderdeskError, OrderdeskResult, SessionError, StoreError};
pub use identity::{
    age, from_epoch_millis, to_epoch_millis, Clock, ManualClock, SystemClock, Timestamp,
    CACHE_TTL, SESSION_TTL,
};
pub use profile::ProfileUpdate;
pub use reference::ReferenceData;
pub use source::{ProfileSink, ReferenceSource};
pub use user::User;
pub use view::{select_view, ApplicationView, SessionState};
