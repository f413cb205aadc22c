//! Top-level presence engine tying the server-side pieces together.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use deepsearch_core::config::realtime::RealtimeConfig;
use deepsearch_core::types::DocumentId;
use deepsearch_entity::presence::Reader;

use crate::channel::TopicRegistry;
use crate::connection::manager::ConnectionManager;
use crate::roster::RosterRegistry;

/// Central engine coordinating connections, topics, and the shared roster.
///
/// Created once at application start and injected wherever presence state
/// is needed; access always goes through this handle, never through
/// globals.
#[derive(Clone)]
pub struct PresenceEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Topic registry.
    pub topics: Arc<TopicRegistry>,
    /// Shared reader roster.
    pub roster: Arc<RosterRegistry>,
    /// Engine configuration.
    pub config: RealtimeConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for PresenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceEngine")
            .field("connections", &self.connections.total_connections())
            .finish()
    }
}

impl PresenceEngine {
    /// Creates a new engine with all subsystems.
    pub fn new(config: RealtimeConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let topics = Arc::new(TopicRegistry::new());
        let roster = Arc::new(RosterRegistry::new());
        let connections = Arc::new(ConnectionManager::new(
            config.clone(),
            topics.clone(),
            roster.clone(),
        ));

        info!("Presence engine initialized");

        Self {
            connections,
            topics,
            roster,
            config,
            shutdown_tx,
        }
    }

    /// Current roster for one document, for the read-side HTTP surface.
    pub fn document_readers(&self, document_id: &DocumentId) -> Vec<Reader> {
        self.roster.document_readers(document_id)
    }

    /// Whether the document has at least one unblocked viewer.
    pub fn has_unblocked_active_readers(&self, document_id: &DocumentId) -> bool {
        self.roster.has_unblocked_active_readers(document_id)
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown: signals tasks and closes every
    /// connection.
    pub fn shutdown(&self) {
        info!("Shutting down presence engine");
        let _ = self.shutdown_tx.send(());
        self.connections.close_all();
    }
}
