//! User administration handlers, proxied to the identity provider.
//!
//! All routes here require the admin role, matching the provider-side
//! service account's own scope.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use deepsearch_core::types::UserId;
use deepsearch_entity::user::{IdentityUser, NewIdentityUser};

use crate::dto::request::{CreateUserRequest, validated};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<IdentityUser>>>, ApiError> {
    auth.require_admin()?;
    let users = state.identity_admin.list_users().await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<IdentityUser>>, ApiError> {
    auth.require_admin()?;
    let user = state.identity_admin.get_user(&UserId::new(id)).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// GET /api/users/username/{username}
pub async fn get_user_by_username(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<IdentityUser>>, ApiError> {
    auth.require_admin()?;
    let user = state
        .identity_admin
        .find_by_username(&username)
        .await?
        .ok_or_else(|| {
            deepsearch_core::error::AppError::not_found(format!("User '{username}' not found"))
        })?;
    Ok(Json(ApiResponse::ok(user)))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    let request = validated(request)?;

    state
        .identity_admin
        .create_user(NewIdentityUser {
            username: request.username,
            email: request.email,
            password: request.password,
        })
        .await?;

    Ok(StatusCode::CREATED)
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(user): Json<IdentityUser>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    state
        .identity_admin
        .update_user(&UserId::new(id), &user)
        .await?;
    Ok(StatusCode::OK)
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    state.identity_admin.delete_user(&UserId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
