//! Identity provider configuration.

use serde::{Deserialize, Serialize};

/// Settings for the external identity provider (Keycloak-compatible).
///
/// Tokens are issued by the provider and verified locally; user
/// administration goes through the provider's admin REST API using a
/// client-credentials service account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the identity provider, e.g. `http://keycloak:8080`.
    pub base_url: String,
    /// Realm that issues tokens for this application.
    #[serde(default = "default_realm")]
    pub realm: String,
    /// RSA public key in PEM format for RS256 token verification.
    /// Takes precedence over `jwt_secret` when set.
    #[serde(default)]
    pub jwt_public_key_pem: Option<String>,
    /// Shared HMAC secret for HS256 token verification.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Clock skew leeway in seconds when validating token expiry.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
    /// Realm role that grants administrative access.
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
    /// Service account client id for the admin API.
    pub admin_client_id: String,
    /// Service account client secret for the admin API.
    pub admin_client_secret: String,
    /// Request timeout for admin API calls, in seconds.
    #[serde(default = "default_admin_timeout")]
    pub admin_timeout_seconds: u64,
}

impl IdentityConfig {
    /// OAuth2 token endpoint for the configured realm.
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.base_url.trim_end_matches('/'),
            self.realm
        )
    }

    /// Admin REST base for user management in the configured realm.
    pub fn admin_users_endpoint(&self) -> String {
        format!(
            "{}/admin/realms/{}/users",
            self.base_url.trim_end_matches('/'),
            self.realm
        )
    }
}

fn default_realm() -> String {
    "master".to_string()
}

fn default_leeway() -> u64 {
    5
}

fn default_admin_role() -> String {
    "admin".to_string()
}

fn default_admin_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> IdentityConfig {
        IdentityConfig {
            base_url: "http://keycloak:8080/".to_string(),
            realm: "master".to_string(),
            jwt_public_key_pem: None,
            jwt_secret: Some("secret".to_string()),
            leeway_seconds: 5,
            admin_role: "admin".to_string(),
            admin_client_id: "console".to_string(),
            admin_client_secret: "s3cr3t".to_string(),
            admin_timeout_seconds: 30,
        }
    }

    #[test]
    fn test_token_endpoint_trims_trailing_slash() {
        assert_eq!(
            config().token_endpoint(),
            "http://keycloak:8080/realms/master/protocol/openid-connect/token"
        );
    }

    #[test]
    fn test_admin_users_endpoint() {
        assert_eq!(
            config().admin_users_endpoint(),
            "http://keycloak:8080/admin/realms/master/users"
        );
    }
}
