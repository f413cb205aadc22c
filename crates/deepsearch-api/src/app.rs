//! Application builder — wires routes, middleware, and state into an Axum
//! app.

use axum::{Router, extract::DefaultBodyLimit, middleware as axum_middleware, routing::get};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::api_routes;
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes();
    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes())
        .route("/ws", get(handlers::ws::ws_upgrade))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(request_logging))
        .with_state(state)
}
