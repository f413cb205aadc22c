//! Admin REST client for user management in the identity provider.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{debug, info};

use deepsearch_core::config::identity::IdentityConfig;
use deepsearch_core::error::AppError;
use deepsearch_core::types::UserId;
use deepsearch_entity::user::{IdentityUser, NewIdentityUser};

use super::token::ServiceTokenCache;

/// Client for the provider's admin users API.
///
/// All user records live in the provider; this client proxies CRUD calls
/// using a service-account token.
#[derive(Debug)]
pub struct IdentityAdminClient {
    http: reqwest::Client,
    config: IdentityConfig,
    token: ServiceTokenCache,
}

impl IdentityAdminClient {
    /// Build a client from identity configuration.
    pub fn new(config: IdentityConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.admin_timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))?;

        let token = ServiceTokenCache::new(http.clone(), config.clone());

        Ok(Self {
            http,
            config,
            token,
        })
    }

    /// List all users in the realm.
    pub async fn list_users(&self) -> Result<Vec<IdentityUser>, AppError> {
        let bearer = self.token.bearer().await?;
        let response = self
            .http
            .get(self.config.admin_users_endpoint())
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| AppError::external(format!("Identity provider unreachable: {e}")))?;

        Self::check_status(response, "list users")
            .await?
            .json()
            .await
            .map_err(|e| AppError::external(format!("Malformed user list: {e}")))
    }

    /// Fetch one user by subject id.
    pub async fn get_user(&self, user_id: &UserId) -> Result<IdentityUser, AppError> {
        let bearer = self.token.bearer().await?;
        let response = self
            .http
            .get(format!(
                "{}/{}",
                self.config.admin_users_endpoint(),
                user_id
            ))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| AppError::external(format!("Identity provider unreachable: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }

        Self::check_status(response, "get user")
            .await?
            .json()
            .await
            .map_err(|e| AppError::external(format!("Malformed user record: {e}")))
    }

    /// Find a user by exact username. Returns `None` when no user matches.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<IdentityUser>, AppError> {
        let bearer = self.token.bearer().await?;
        let response = self
            .http
            .get(self.config.admin_users_endpoint())
            .query(&[("username", username), ("exact", "true")])
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| AppError::external(format!("Identity provider unreachable: {e}")))?;

        let users: Vec<IdentityUser> = Self::check_status(response, "search users")
            .await?
            .json()
            .await
            .map_err(|e| AppError::external(format!("Malformed user list: {e}")))?;

        Ok(users.into_iter().next())
    }

    /// Create a user with an initial non-temporary password.
    pub async fn create_user(&self, new: NewIdentityUser) -> Result<(), AppError> {
        let bearer = self.token.bearer().await?;
        let body = serde_json::json!({
            "username": new.username,
            "email": new.email,
            "enabled": true,
            "credentials": [{
                "type": "password",
                "value": new.password,
                "temporary": false,
            }],
        });

        let response = self
            .http
            .post(self.config.admin_users_endpoint())
            .bearer_auth(bearer)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::external(format!("Identity provider unreachable: {e}")))?;

        if response.status() == StatusCode::CONFLICT {
            return Err(AppError::conflict(format!(
                "User '{}' already exists",
                new.username
            )));
        }

        Self::check_status(response, "create user").await?;
        info!(username = %new.username, "User created in identity provider");
        Ok(())
    }

    /// Replace a user's representation.
    pub async fn update_user(&self, user_id: &UserId, user: &IdentityUser) -> Result<(), AppError> {
        let bearer = self.token.bearer().await?;
        let response = self
            .http
            .put(format!(
                "{}/{}",
                self.config.admin_users_endpoint(),
                user_id
            ))
            .bearer_auth(bearer)
            .json(user)
            .send()
            .await
            .map_err(|e| AppError::external(format!("Identity provider unreachable: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }

        Self::check_status(response, "update user").await?;
        debug!(user_id = %user_id, "User updated in identity provider");
        Ok(())
    }

    /// Delete a user.
    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), AppError> {
        let bearer = self.token.bearer().await?;
        let response = self
            .http
            .delete(format!(
                "{}/{}",
                self.config.admin_users_endpoint(),
                user_id
            ))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| AppError::external(format!("Identity provider unreachable: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }

        Self::check_status(response, "delete user").await?;
        info!(user_id = %user_id, "User deleted from identity provider");
        Ok(())
    }

    /// Map a non-success response into an external-service error.
    async fn check_status(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<reqwest::Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::external(format!(
            "Identity provider {operation} failed with {status}: {body}"
        )))
    }
}
