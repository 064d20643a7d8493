//! The user identity record.

use serde::{Deserialize, Serialize};

/// Identity record as held by the remote record store.
///
/// Field names follow the record store's column headers. The record is only
/// ever replaced as a whole; nothing in the session layer patches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "UserName")]
    pub username: String,
    #[serde(rename = "FullName", default)]
    pub full_name: String,
    /// Comma-separated team memberships, possibly empty.
    #[serde(rename = "Team", default)]
    pub team: String,
    #[serde(rename = "Role", default)]
    pub role: String,
    #[serde(rename = "IsSystemAdmin", default)]
    pub is_system_admin: bool,
    #[serde(rename = "ProfilePictureURL", default)]
    pub profile_picture_url: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            full_name: String::new(),
            team: String::new(),
            role: String::new(),
            is_system_admin: false,
            profile_picture_url: String::new(),
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = team.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_system_admin(mut self, is_system_admin: bool) -> Self {
        self.is_system_admin = is_system_admin;
        self
    }

    /// Team memberships with surrounding whitespace trimmed and blanks dropped.
    pub fn teams(&self) -> Vec<&str> {
        self.team
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn is_member_of(&self, team: &str) -> bool {
        self.teams().contains(&team.trim())
    }

    /// A system administrator who also belongs to at least one team.
    pub fn is_hybrid_admin(&self) -> bool {
        self.is_system_admin && !self.teams().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teams_trims_and_drops_blanks() {
        let user = User::new("u").with_team(" Sales, ,Ops ,");
        assert_eq!(user.teams(), vec!["Sales", "Ops"]);
    }

    #[test]
    fn test_empty_team_list() {
        assert!(User::new("u").teams().is_empty());
        assert!(User::new("u").with_team(" , ").teams().is_empty());
    }

    #[test]
    fn test_hybrid_admin() {
        assert!(User::new("a").with_system_admin(true).with_team("Ops").is_hybrid_admin());
        assert!(!User::new("a").with_system_admin(true).is_hybrid_admin());
        assert!(!User::new("u").with_team("Ops").is_hybrid_admin());
    }

    #[test]
    fn test_deserialize_record_store_fields() {
        let json = r#"{
            "UserName": "user42",
            "FullName": "Dara Sok",
            "Role": "Seller",
            "Team": "Sales",
            "IsSystemAdmin": false,
            "ProfilePictureURL": "https://img.example.com/u42.png",
            "Password": "ignored"
        }"#;
        let user: User = serde_json::from_str(json).expect("user should parse");
        assert_eq!(user.username, "user42");
        assert_eq!(user.team, "Sales");
        assert!(!user.is_system_admin);

        let encoded = serde_json::to_string(&user).expect("user should encode");
        assert!(!encoded.contains("Password"));
    }
}
