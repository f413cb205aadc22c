//! Service-account token acquisition and caching.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use deepsearch_core::config::identity::IdentityConfig;
use deepsearch_core::error::AppError;

/// Safety margin subtracted from the provider's expiry so a token is never
/// used right at its deadline.
const EXPIRY_MARGIN_SECONDS: i64 = 30;

/// Response shape of the provider's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// A cached service-account access token.
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The bearer token value.
    pub access_token: String,
    /// When the token stops being usable (margin already applied).
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Whether the token is still usable at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Acquires and caches client-credentials tokens for the admin API.
#[derive(Debug)]
pub struct ServiceTokenCache {
    http: reqwest::Client,
    config: IdentityConfig,
    cached: RwLock<Option<CachedToken>>,
}

impl ServiceTokenCache {
    /// Create a token cache backed by the given HTTP client.
    pub fn new(http: reqwest::Client, config: IdentityConfig) -> Self {
        Self {
            http,
            config,
            cached: RwLock::new(None),
        }
    }

    /// Return a currently-valid bearer token, fetching a new one if the
    /// cached token is missing or near expiry.
    pub async fn bearer(&self) -> Result<String, AppError> {
        let now = Utc::now();

        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.access_token.clone());
            }
        }

        let mut slot = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = slot.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.fetch().await?;
        let bearer = token.access_token.clone();
        *slot = Some(token);
        Ok(bearer)
    }

    async fn fetch(&self) -> Result<CachedToken, AppError> {
        debug!(realm = %self.config.realm, "Fetching service-account token");

        let response = self
            .http
            .post(self.config.token_endpoint())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.admin_client_id.as_str()),
                ("client_secret", self.config.admin_client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::external(format!("Token endpoint unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::external(format!("Malformed token response: {e}")))?;

        let lifetime = Duration::seconds((token.expires_in - EXPIRY_MARGIN_SECONDS).max(0));
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + lifetime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_within_lifetime() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "t".to_string(),
            expires_at: now + Duration::seconds(60),
        };
        assert!(token.is_fresh(now));
    }

    #[test]
    fn test_stale_token_at_expiry() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "t".to_string(),
            expires_at: now,
        };
        assert!(!token.is_fresh(now));
    }
}
