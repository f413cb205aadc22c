//! Notification handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use deepsearch_core::types::UserId;
use deepsearch_entity::notification::{NewNotification, Notification};

use crate::dto::request::{CreateNotificationRequest, validated};
use crate::dto::response::{ApiResponse, CountResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<Notification>>>, ApiError> {
    let notifications = state.notification_repo.find_by_user(&auth.user_id).await?;
    Ok(Json(ApiResponse::ok(notifications)))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.notification_repo.mark_all_read(&auth.user_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// POST /api/notifications (admin only)
pub async fn create_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Notification>>), ApiError> {
    auth.require_admin()?;
    let request = validated(request)?;

    let notification = state
        .notification_repo
        .create(NewNotification {
            user_id: UserId::new(request.user_id),
            title: request.title,
            message: request.message,
            kind: request.kind,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(notification))))
}
