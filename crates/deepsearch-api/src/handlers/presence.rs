//! Presence roster read-side handlers.

use axum::Json;
use axum::extract::{Path, State};

use deepsearch_core::types::DocumentId;

use crate::dto::response::{ApiResponse, RosterResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/presence/documents/{id}
///
/// The roster is advisory UI state; it may lag reality and that is fine.
pub async fn document_roster(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RosterResponse>>, ApiError> {
    let document_id = DocumentId::new(id);
    let readers = state.presence.document_readers(&document_id);
    let has_unblocked_active_readers =
        state.presence.has_unblocked_active_readers(&document_id);

    Ok(Json(ApiResponse::ok(RosterResponse {
        document_id,
        readers,
        has_unblocked_active_readers,
    })))
}
