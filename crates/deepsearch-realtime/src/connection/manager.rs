//! Connection manager — registration, inbound dispatch, and fan-out.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use deepsearch_core::config::realtime::RealtimeConfig;
use deepsearch_core::types::{DocumentId, UserId};
use deepsearch_entity::presence::{EventType, PresenceEvent, Reader};

use crate::channel::{TopicRegistry, user_topic};
use crate::message::{serializer, validator};
use crate::roster::RosterRegistry;

use super::handle::{ConnectionHandle, ConnectionId, WireFrame};
use super::pool::ConnectionPool;

/// Manages all active presence connections.
///
/// Every inbound frame is a presence event envelope on the single logical
/// action endpoint; the manager dispatches by event type, reconciles the
/// shared roster, and fans events out to the private inbox topics of the
/// affected document's viewers. Delivery is fire-and-forget throughout.
#[derive(Debug)]
pub struct ConnectionManager {
    pool: Arc<ConnectionPool>,
    topics: Arc<TopicRegistry>,
    roster: Arc<RosterRegistry>,
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: RealtimeConfig,
        topics: Arc<TopicRegistry>,
        roster: Arc<RosterRegistry>,
    ) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new()),
            topics,
            roster,
            config,
        }
    }

    /// Registers a new authenticated connection.
    ///
    /// Returns the connection handle and the receiver feeding the socket's
    /// write half. The connection is auto-subscribed to its user's private
    /// inbox topic.
    pub fn register(
        &self,
        user_id: UserId,
        username: String,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<WireFrame>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(user_id.clone(), username, tx));

        let existing = self.pool.user_connections(&user_id);
        if existing.len() >= self.config.max_connections_per_user {
            warn!(
                user_id = %user_id,
                count = existing.len(),
                max = self.config.max_connections_per_user,
                "User at max connections, oldest will be replaced"
            );
            if let Some(oldest) = existing.first() {
                oldest.mark_closed();
                self.pool.remove(&oldest.id);
                self.topics.unsubscribe_all(&oldest.id);
            }
        }

        self.pool.add(handle.clone());
        self.topics.subscribe(&user_topic(&user_id), handle.id);

        info!(
            conn_id = %handle.id,
            user_id = %user_id,
            "Presence connection registered"
        );

        (handle, rx)
    }

    /// Unregisters a connection and cleans up its subscriptions.
    ///
    /// When the user's last connection goes away, their reader records are
    /// removed from every roster and the remaining viewers of those
    /// documents are told, best-effort, that the viewer left.
    pub async fn unregister(&self, conn_id: &ConnectionId) {
        let Some(handle) = self.pool.remove(conn_id) else {
            return;
        };
        handle.mark_closed();
        self.topics.unsubscribe_all(conn_id);

        let remaining = self.pool.user_connections(&handle.user_id);
        if remaining.is_empty() {
            let documents = self.roster.remove_reader_everywhere(&handle.user_id);
            for document_id in documents {
                let event = PresenceEvent::viewer_left(handle.user_id.clone(), document_id.clone());
                self.fan_out(&document_id, &event, Some(&handle.user_id))
                    .await;
            }
        }

        info!(
            conn_id = %conn_id,
            user_id = %handle.user_id,
            "Presence connection unregistered"
        );
    }

    /// Processes one inbound frame from a client.
    ///
    /// Malformed frames are logged and dropped; nothing here errors back to
    /// the sender.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw: &str) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "Frame from unknown connection");
            return;
        };
        handle.touch();

        if let Err(e) = validator::validate_frame(raw, self.config.max_frame_bytes) {
            warn!(conn_id = %conn_id, error = %e, "Rejecting invalid frame");
            return;
        }

        let event = match serializer::deserialize_event(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "Dropping malformed presence event");
                return;
            }
        };

        match event.message_type {
            EventType::ViewerJoined => self.handle_join(&handle, event).await,
            EventType::ViewerLeft => self.handle_leave(&handle, event).await,
            EventType::BlockToggled => self.handle_block(&handle, event).await,
            EventType::Unknown => {
                debug!(conn_id = %conn_id, "Ignoring unknown presence event type");
            }
        }
    }

    /// A viewer announced itself on a document.
    async fn handle_join(&self, handle: &ConnectionHandle, event: PresenceEvent) {
        let Some(document_id) = event.document_id.clone() else {
            debug!(conn_id = %handle.id, "Join without document id ignored");
            return;
        };

        let mut reader = event.user.clone().unwrap_or_else(|| {
            Reader::new(
                event.sender_id.clone(),
                handle.username.clone(),
                None,
                document_id.clone(),
                Utc::now(),
            )
        });
        if reader.document_id.is_none() {
            reader.document_id = Some(document_id.clone());
        }

        // Peers the joiner should learn about, captured before the upsert.
        let peers: Vec<Reader> = self
            .roster
            .document_readers(&document_id)
            .into_iter()
            .filter(|r| r.id != event.sender_id)
            .collect();

        let Some(stored) = self.roster.upsert(reader) else {
            return;
        };

        debug!(
            conn_id = %handle.id,
            user_id = %event.sender_id,
            document_id = %document_id,
            "Viewer joined"
        );

        if !peers.is_empty() {
            let snapshot =
                PresenceEvent::roster_snapshot(event.sender_id.clone(), document_id.clone(), peers);
            self.send_to_user(&event.sender_id, &snapshot).await;
        }

        let joined = PresenceEvent::viewer_joined(event.sender_id.clone(), document_id.clone(), stored);
        self.fan_out(&document_id, &joined, Some(&event.sender_id))
            .await;
    }

    /// A viewer announced it is leaving a document.
    async fn handle_leave(&self, handle: &ConnectionHandle, event: PresenceEvent) {
        let Some(document_id) = event.document_id.clone() else {
            debug!(conn_id = %handle.id, "Leave without document id ignored");
            return;
        };

        // A leave for an unknown key is a no-op, not an error.
        if self.roster.remove(&document_id, &event.sender_id).is_none() {
            return;
        }

        debug!(
            conn_id = %handle.id,
            user_id = %event.sender_id,
            document_id = %document_id,
            "Viewer left"
        );

        let left = PresenceEvent::viewer_left(event.sender_id.clone(), document_id.clone());
        self.fan_out(&document_id, &left, Some(&event.sender_id))
            .await;
    }

    /// A privileged viewer toggled a reader's blocked flag.
    ///
    /// Purely advisory at this layer: durable enforcement belongs to the
    /// document backend.
    async fn handle_block(&self, handle: &ConnectionHandle, event: PresenceEvent) {
        let (Some(document_id), Some(target_id)) =
            (event.document_id.clone(), event.target_id().cloned())
        else {
            debug!(conn_id = %handle.id, "Block toggle without target ignored");
            return;
        };

        let Some(updated) = self.roster.toggle_block(&document_id, &target_id) else {
            debug!(
                conn_id = %handle.id,
                document_id = %document_id,
                target = %target_id,
                "Block toggle for unknown reader ignored"
            );
            return;
        };

        debug!(
            conn_id = %handle.id,
            document_id = %document_id,
            target = %target_id,
            is_blocked = updated.is_blocked,
            "Reader block toggled"
        );

        let toggled = PresenceEvent::block_toggled(
            event.sender_id.clone(),
            document_id.clone(),
            target_id,
            Some(updated),
        );
        // Everyone viewing the document sees the flip, the sender included.
        self.fan_out(&document_id, &toggled, None).await;
    }

    /// Deliver an event to every connection on one user's inbox topic.
    pub async fn send_to_user(&self, user_id: &UserId, event: &PresenceEvent) {
        let text = match serializer::serialize_event(event) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to serialize outbound event");
                return;
            }
        };

        for conn_id in self.topics.subscribers(&user_topic(user_id)) {
            if let Some(handle) = self.pool.get(&conn_id) {
                if !handle.send(WireFrame::Event(text.clone())).await {
                    debug!(conn_id = %conn_id, "Dropped event for closed connection");
                }
            }
        }
    }

    /// Deliver an event to every viewer of a document, optionally skipping
    /// one user (usually the sender).
    async fn fan_out(
        &self,
        document_id: &DocumentId,
        event: &PresenceEvent,
        exclude: Option<&UserId>,
    ) {
        for reader in self.roster.document_readers(document_id) {
            if exclude.is_some_and(|user_id| user_id == &reader.id) {
                continue;
            }
            self.send_to_user(&reader.id, event).await;
        }
    }

    /// Close every connection. Used during engine shutdown.
    pub fn close_all(&self) {
        for handle in self.pool.all_connections() {
            handle.mark_closed();
        }
    }

    /// Total live connections.
    pub fn total_connections(&self) -> usize {
        self.pool.len()
    }

    /// Number of distinct connected users.
    pub fn unique_users(&self) -> usize {
        self.pool.unique_users()
    }
}
