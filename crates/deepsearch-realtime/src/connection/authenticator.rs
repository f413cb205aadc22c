//! Connection authentication before the WebSocket upgrade.

use std::sync::Arc;

use tracing::debug;

use deepsearch_core::error::AppError;
use deepsearch_core::types::UserId;
use deepsearch_identity::JwtDecoder;

/// Identity attached to an authenticated connection.
#[derive(Debug, Clone)]
pub struct AuthenticatedConnection {
    /// Subject id.
    pub user_id: UserId,
    /// Username at connect time.
    pub username: String,
    /// Email, when the token carries one.
    pub email: Option<String>,
    /// Realm roles granted by the token.
    pub roles: Vec<String>,
}

/// Validates the bearer credential presented at the handshake.
#[derive(Debug, Clone)]
pub struct WsAuthenticator {
    decoder: Arc<JwtDecoder>,
}

impl WsAuthenticator {
    /// Creates an authenticator around the shared token decoder.
    pub fn new(decoder: Arc<JwtDecoder>) -> Self {
        Self { decoder }
    }

    /// Authenticate a token, returning the connection identity.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedConnection, AppError> {
        let claims = self.decoder.decode(token)?;

        debug!(user_id = %claims.sub, "Presence connection authenticated");

        Ok(AuthenticatedConnection {
            user_id: claims.user_id(),
            username: claims.username().to_string(),
            email: claims.email.clone(),
            roles: claims.roles().to_vec(),
        })
    }
}
