//! Claims embedded in provider-issued access tokens.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use deepsearch_core::types::UserId;

/// Claims payload of an access token issued by the identity provider.
///
/// Only the claims this application reads are modeled; everything else in
/// the token is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the provider's opaque user id.
    pub sub: String,
    /// Preferred login name, when the provider includes it.
    #[serde(default)]
    pub preferred_username: Option<String>,
    /// Email address, when the provider includes it.
    #[serde(default)]
    pub email: Option<String>,
    /// Realm-level role grants.
    #[serde(default)]
    pub realm_access: Option<RealmAccess>,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issued-at timestamp (seconds since epoch).
    #[serde(default)]
    pub iat: Option<i64>,
}

/// The provider's realm-role container claim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmAccess {
    /// Role names granted in the realm.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Returns the subject as a typed user id.
    pub fn user_id(&self) -> UserId {
        UserId::new(self.sub.clone())
    }

    /// Returns the best username available, falling back to the subject.
    pub fn username(&self) -> &str {
        self.preferred_username.as_deref().unwrap_or(&self.sub)
    }

    /// Returns the realm roles granted by this token.
    pub fn roles(&self) -> &[String] {
        self.realm_access
            .as_ref()
            .map(|ra| ra.roles.as_slice())
            .unwrap_or(&[])
    }

    /// Checks whether the token grants the given realm role
    /// (case-insensitive, matching the provider's conventions).
    pub fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    /// Checks whether this token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_from_realm_access() {
        let json = r#"{
            "sub": "4f2c8a90-1b1e-4f6e-9a7d-2d1e8c3b5a01",
            "preferred_username": "ada",
            "email": "ada@example.com",
            "realm_access": {"roles": ["ADMIN", "offline_access"]},
            "exp": 4102444800
        }"#;
        let claims: Claims = serde_json::from_str(json).expect("deserialize");
        assert!(claims.has_role("admin"));
        assert!(!claims.has_role("manager"));
        assert_eq!(claims.username(), "ada");
    }

    #[test]
    fn test_missing_optional_claims() {
        let json = r#"{"sub": "abc", "exp": 4102444800}"#;
        let claims: Claims = serde_json::from_str(json).expect("deserialize");
        assert!(claims.roles().is_empty());
        assert_eq!(claims.username(), "abc");
        assert!(!claims.is_expired());
    }
}
