//! DeepSearch Console Backend
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use deepsearch_core::config::AppConfig;
use deepsearch_core::error::AppError;

#[tokio::main]
async fn main() {
    let env = std::env::var("DEEPSEARCH_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function.
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting DeepSearch console v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db_pool = deepsearch_database::connection::create_pool(&config.database).await?;

    tracing::info!("Running database migrations...");
    deepsearch_database::migration::run_migrations(&db_pool).await?;

    // ── Step 2: External service clients ─────────────────────────
    tracing::info!("Initializing identity provider client...");
    let jwt_decoder = Arc::new(deepsearch_identity::JwtDecoder::new(&config.identity)?);
    let identity_admin = Arc::new(deepsearch_identity::IdentityAdminClient::new(
        config.identity.clone(),
    )?);

    tracing::info!("Initializing document backend client...");
    let docstore = Arc::new(deepsearch_docstore::DocstoreClient::new(
        config.docstore.clone(),
    )?);

    // ── Step 3: Repositories and services ────────────────────────
    let notification_repo = Arc::new(
        deepsearch_database::repositories::NotificationRepository::new(db_pool.clone()),
    );
    let summary_repo = Arc::new(deepsearch_database::repositories::SummaryRepository::new(
        db_pool.clone(),
    ));
    let summarizer = Arc::new(deepsearch_summarize::SummarizeService::new(
        config.summarizer.clone(),
        docstore.clone(),
        summary_repo,
    )?);

    // ── Step 4: Presence engine ──────────────────────────────────
    let presence = Arc::new(deepsearch_realtime::PresenceEngine::new(
        config.realtime.clone(),
    ));

    // ── Step 5: HTTP server ──────────────────────────────────────
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = deepsearch_api::AppState {
        config: Arc::new(config),
        db_pool,
        jwt_decoder,
        identity_admin,
        docstore,
        summarizer,
        notification_repo,
        presence: presence.clone(),
    };

    let app = deepsearch_api::build_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {bind_addr}: {e}")))?;

    tracing::info!("Listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(presence))
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves when a shutdown signal arrives, then closes the presence
/// engine so live connections are torn down before the listener stops.
async fn shutdown_signal(presence: Arc<deepsearch_realtime::PresenceEngine>) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
    presence.shutdown();
}
