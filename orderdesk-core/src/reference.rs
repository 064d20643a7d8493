//! Reference data shared across every view.

use crate::user::User;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Aggregate of the record store's lookup collections.
///
/// Only `users` is typed; the other collections are passed through to the
/// views untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceData {
    pub users: Vec<User>,
    pub products: Vec<Value>,
    pub teams: Vec<Value>,
    pub locations: Vec<Value>,
    pub shipping_methods: Vec<Value>,
    pub drivers: Vec<Value>,
    pub bank_accounts: Vec<Value>,
    pub phone_carriers: Vec<Value>,
    pub telegram_templates: Vec<Value>,
    pub pages: Vec<Value>,
    pub colors: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<Value>,
}

impl ReferenceData {
    /// Replace the user list, as done when merging the separately fetched
    /// users into the static collections.
    pub fn with_users(mut self, users: Vec<User>) -> Self {
        self.users = users;
        self
    }

    pub fn find_user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }
}
