//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use deepsearch_core::types::UserId;

/// A persisted notification addressed to one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Primary key.
    pub id: Uuid,
    /// Recipient's subject id.
    pub user_id: UserId,
    /// Short title.
    pub title: String,
    /// Notification body.
    pub message: String,
    /// Category string, e.g. `"info"`, `"warning"`.
    pub kind: String,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    /// Recipient's subject id.
    pub user_id: UserId,
    /// Short title.
    pub title: String,
    /// Notification body.
    pub message: String,
    /// Category string.
    pub kind: String,
}
