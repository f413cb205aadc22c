//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use deepsearch_core::config::AppConfig;
use deepsearch_database::repositories::NotificationRepository;
use deepsearch_docstore::DocstoreClient;
use deepsearch_identity::{IdentityAdminClient, JwtDecoder};
use deepsearch_realtime::PresenceEngine;
use deepsearch_summarize::SummarizeService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks; nothing here is reached
/// through globals.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool.
    pub db_pool: PgPool,
    /// Bearer token decoder.
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Identity provider admin client.
    pub identity_admin: Arc<IdentityAdminClient>,
    /// Document backend client.
    pub docstore: Arc<DocstoreClient>,
    /// Summarization service.
    pub summarizer: Arc<SummarizeService>,
    /// Notification repository.
    pub notification_repo: Arc<NotificationRepository>,
    /// Presence engine.
    pub presence: Arc<PresenceEngine>,
}
