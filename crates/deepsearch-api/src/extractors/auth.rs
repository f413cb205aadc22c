//! `AuthUser` extractor — pulls the bearer token from the Authorization
//! header, validates it, and injects the caller's identity.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use deepsearch_core::error::AppError;
use deepsearch_core::types::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, available to every protected handler.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Subject id.
    pub user_id: UserId,
    /// Username from the token.
    pub username: String,
    /// Email from the token.
    pub email: Option<String>,
    /// Realm roles from the token.
    pub roles: Vec<String>,
    /// Whether the configured admin role was granted.
    pub is_admin: bool,
}

impl AuthUser {
    /// Errors unless the caller holds the admin role.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::authorization("Administrator role required").into())
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::authentication("Invalid Authorization header format"))?;

        let claims = state.jwt_decoder.decode(token)?;
        let is_admin = claims.has_role(&state.config.identity.admin_role);

        Ok(AuthUser {
            user_id: claims.user_id(),
            username: claims.username().to_string(),
            email: claims.email.clone(),
            roles: claims.roles().to_vec(),
            is_admin,
        })
    }
}
