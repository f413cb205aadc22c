//! User representations exchanged with the identity provider's admin API.

use serde::{Deserialize, Serialize};

use deepsearch_core::types::UserId;

/// A user as represented by the identity provider.
///
/// Field names follow the provider's wire format (camelCase). The account
/// itself lives in the provider; this service never persists users.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    /// Subject identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Whether the account is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Whether the email address has been verified.
    #[serde(default)]
    pub email_verified: bool,
}

impl IdentityUser {
    /// Best display name available: full name, else username.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

/// Data required to create a user in the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIdentityUser {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Initial password (set non-temporary in the provider).
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = r#"{
            "id": "u-1",
            "username": "ada",
            "email": "ada@example.com",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "enabled": true,
            "emailVerified": true
        }"#;
        let user: IdentityUser = serde_json::from_str(json).expect("deserialize");
        assert_eq!(user.first_name.as_deref(), Some("Ada"));
        assert!(user.email_verified);
        assert_eq!(user.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let json = r#"{"id": "u-2", "username": "grace"}"#;
        let user: IdentityUser = serde_json::from_str(json).expect("deserialize");
        assert_eq!(user.display_name(), "grace");
    }
}
