//! Response DTOs.

use serde::{Deserialize, Serialize};

use deepsearch_core::types::DocumentId;
use deepsearch_entity::presence::Reader;

/// Uniform success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Always `true` for success responses.
    pub success: bool,
    /// Payload.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wrap a payload in the success envelope.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Basic liveness payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process answers.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Extended health payload with dependency checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Database connectivity.
    pub database: String,
    /// Document backend reachability.
    pub docstore: String,
    /// Live presence connections.
    pub ws_connections: usize,
    /// Distinct connected users.
    pub online_users: usize,
}

/// Count payload for bulk operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Number of affected rows.
    pub count: u64,
}

/// Roster read-side payload for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterResponse {
    /// Document the roster is scoped to.
    pub document_id: DocumentId,
    /// Current readers.
    pub readers: Vec<Reader>,
    /// Whether any reader is currently not blocked.
    pub has_unblocked_active_readers: bool,
}
