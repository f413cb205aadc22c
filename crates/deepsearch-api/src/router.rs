//! Route definitions for the DeepSearch HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`; the
//! presence WebSocket upgrade lives at `/ws`. The router receives
//! `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::handlers;
use crate::state::AppState;

/// All `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(document_routes())
        .merge(user_routes())
        .merge(notification_routes())
        .merge(presence_routes())
        .merge(health_routes())
}

/// Document proxy endpoints.
fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/documents", get(handlers::document::list_documents))
        .route("/documents/upload", post(handlers::document::upload_document))
        .route("/documents/{id}", get(handlers::document::get_document))
        .route("/documents/{id}", delete(handlers::document::delete_document))
        .route(
            "/documents/{id}/versions/{vid}/pages/{pid}/ocr",
            get(handlers::document::page_ocr),
        )
        .route(
            "/documents/{id}/versions/{vid}/pages/{pid}/summarize",
            post(handlers::document::summarize_page),
        )
}

/// Identity provider user administration.
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::user::list_users))
        .route("/users", post(handlers::user::create_user))
        .route(
            "/users/username/{username}",
            get(handlers::user::get_user_by_username),
        )
        .route("/users/{id}", get(handlers::user::get_user))
        .route("/users/{id}", put(handlers::user::update_user))
        .route("/users/{id}", delete(handlers::user::delete_user))
}

/// Notification endpoints.
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications",
            post(handlers::notification::create_notification),
        )
        .route(
            "/notifications/read-all",
            put(handlers::notification::mark_all_read),
        )
}

/// Presence roster read side.
fn presence_routes() -> Router<AppState> {
    Router::new().route(
        "/presence/documents/{id}",
        get(handlers::presence::document_roster),
    )
}

/// Health check endpoints (no auth required).
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/detailed", get(handlers::health::detailed_health))
}
