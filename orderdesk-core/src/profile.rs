//! Self-service profile edits.

use crate::error::SessionError;
use secrecy::{ExposeSecret, SecretString};

/// A user's request to change their own profile.
///
/// An empty `new_password` leaves the stored password unchanged on the
/// remote side.
#[derive(Debug)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub new_password: SecretString,
    pub confirm_password: SecretString,
    pub profile_picture_url: String,
}

impl ProfileUpdate {
    pub fn new(full_name: impl Into<String>, profile_picture_url: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            new_password: SecretString::from(String::new()),
            confirm_password: SecretString::from(String::new()),
            profile_picture_url: profile_picture_url.into(),
        }
    }

    pub fn with_password(mut self, password: SecretString, confirmation: SecretString) -> Self {
        self.new_password = password;
        self.confirm_password = confirmation;
        self
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.full_name.trim().is_empty() {
            return Err(SessionError::InvalidProfile {
                reason: "full name must not be empty".to_string(),
            });
        }
        if self.new_password.expose_secret() != self.confirm_password.expose_secret() {
            return Err(SessionError::InvalidProfile {
                reason: "password confirmation does not match".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_name_only_update_is_valid() {
        let update = ProfileUpdate::new("Dara Sok", "");
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_blank_full_name_rejected() {
        let update = ProfileUpdate::new("   ", "");
        assert!(matches!(
            update.validate(),
            Err(SessionError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn test_password_mismatch_rejected() {
        let update =
            ProfileUpdate::new("Dara Sok", "").with_password(secret("hunter2"), secret("hunter3"));
        assert!(update.validate().is_err());

        let update =
            ProfileUpdate::new("Dara Sok", "").with_password(secret("hunter2"), secret("hunter2"));
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_passwords() {
        let update =
            ProfileUpdate::new("Dara Sok", "").with_password(secret("hunter2"), secret("hunter2"));
        assert!(!format!("{:?}", update).contains("hunter2"));
    }
}
