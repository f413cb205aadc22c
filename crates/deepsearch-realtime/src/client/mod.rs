//! Presence channel client.
//!
//! One client per open document-viewer tab. The client owns a single push
//! connection, announces viewing start/end, mirrors peer events into its
//! local roster, and reconnects on a flat delay after transport loss. All
//! publishing is fire-and-forget: a publish before the channel is
//! `Connected` is logged and dropped, never queued.

pub mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock as StdRwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use deepsearch_core::config::realtime::RealtimeConfig;
use deepsearch_core::error::AppError;
use deepsearch_core::types::{DocumentId, UserId};
use deepsearch_entity::presence::{PresenceEvent, Reader};

use crate::message::{EventSink, serializer};
use crate::roster::RosterRegistry;

pub use state::ChannelState;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Callback invoked for every inbound event, before roster reconciliation.
pub type EventHandler = Arc<dyn Fn(&PresenceEvent) + Send + Sync>;

/// Client-side configuration.
#[derive(Debug, Clone)]
pub struct PresenceClientConfig {
    /// WebSocket endpoint, e.g. `ws://host:8082/ws`.
    pub url: String,
    /// Flat delay between reconnect attempts.
    pub reconnect_delay: Duration,
    /// Outbound queue capacity.
    pub channel_buffer_size: usize,
}

impl PresenceClientConfig {
    /// Derive client settings from the shared realtime configuration.
    pub fn from_realtime(url: impl Into<String>, config: &RealtimeConfig) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_seconds),
            channel_buffer_size: config.channel_buffer_size,
        }
    }
}

/// The identity and credential a client connects with.
///
/// Handed over by the surrounding application shell; the client never
/// refreshes the credential itself.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// Subject id.
    pub user_id: UserId,
    /// Login name, embedded in join announcements.
    pub username: String,
    /// Email, embedded in join announcements when known.
    pub email: Option<String>,
    /// Bearer credential attached at the handshake.
    pub token: String,
}

/// A presence channel client bound to one user identity.
pub struct PresenceClient {
    config: PresenceClientConfig,
    identity: ClientIdentity,
    state: StdRwLock<ChannelState>,
    outbound_tx: mpsc::Sender<String>,
    outbound_rx: Mutex<Option<mpsc::Receiver<String>>>,
    roster: Arc<RosterRegistry>,
    shutdown_tx: watch::Sender<bool>,
    started: AtomicBool,
    handler: StdRwLock<Option<EventHandler>>,
}

impl std::fmt::Debug for PresenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceClient")
            .field("url", &self.config.url)
            .field("user_id", &self.identity.user_id)
            .field("state", &self.state())
            .finish()
    }
}

impl PresenceClient {
    /// Create a client in the `Disconnected` state. Nothing happens until
    /// [`Self::connect`] is called.
    pub fn new(config: PresenceClientConfig, identity: ClientIdentity) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(config.channel_buffer_size.max(1));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            identity,
            state: StdRwLock::new(ChannelState::Disconnected),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            roster: Arc::new(RosterRegistry::new()),
            shutdown_tx,
            started: AtomicBool::new(false),
            handler: StdRwLock::new(None),
        }
    }

    /// Register a callback invoked for every inbound event before it is
    /// applied to the roster.
    pub fn set_event_handler(&self, handler: EventHandler) {
        if let Ok(mut slot) = self.handler.write() {
            *slot = Some(handler);
        }
    }

    /// Start the connection task.
    ///
    /// Requires both an identity and a credential; with either missing the
    /// channel does not attempt to connect. The task retries failed
    /// connections forever on the flat delay until [`Self::close`].
    pub fn connect(self: &Arc<Self>) -> Result<(), AppError> {
        if self.identity.user_id.as_str().is_empty() || self.identity.token.is_empty() {
            return Err(AppError::authentication(
                "Presence channel needs an identity and a credential before connecting",
            ));
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(AppError::conflict("Presence client already started"));
        }

        let client = self.clone();
        tokio::spawn(async move { client.run_loop().await });
        Ok(())
    }

    /// Current connection state.
    pub fn state(&self) -> ChannelState {
        self.state
            .read()
            .map(|s| *s)
            .unwrap_or(ChannelState::Disconnected)
    }

    /// The local roster handle.
    pub fn roster(&self) -> &Arc<RosterRegistry> {
        &self.roster
    }

    /// Roster entries for one document.
    pub fn document_readers(&self, document_id: &DocumentId) -> Vec<Reader> {
        self.roster.document_readers(document_id)
    }

    /// Whether any unblocked peer is currently viewing the document.
    pub fn has_unblocked_active_readers(&self, document_id: &DocumentId) -> bool {
        self.roster.has_unblocked_active_readers(document_id)
    }

    /// Announce that this user started viewing a document.
    ///
    /// Callers poll until the channel reports `Connected` before the first
    /// announce can succeed; an early call is dropped, not queued.
    pub async fn announce_join(&self, document_id: &DocumentId) {
        let reader = Reader::new(
            self.identity.user_id.clone(),
            self.identity.username.clone(),
            self.identity.email.clone(),
            document_id.clone(),
            Utc::now(),
        );
        let event = PresenceEvent::viewer_joined(
            self.identity.user_id.clone(),
            document_id.clone(),
            reader,
        );
        self.publish_event(&event).await;
    }

    /// Announce that this user stopped viewing a document. Best-effort.
    pub async fn announce_leave(&self, document_id: &DocumentId) {
        let event = PresenceEvent::viewer_left(self.identity.user_id.clone(), document_id.clone());
        self.publish_event(&event).await;
    }

    /// Toggle another reader's blocked flag. Advisory: durable enforcement
    /// lives in the document backend, and the local roster only flips when
    /// the server echoes the event back.
    pub async fn toggle_block(&self, document_id: &DocumentId, target_id: &UserId) {
        let snapshot = self.roster.get(document_id, target_id);
        let event = PresenceEvent::block_toggled(
            self.identity.user_id.clone(),
            document_id.clone(),
            target_id.clone(),
            snapshot,
        );
        self.publish_event(&event).await;
    }

    /// Tear the channel down: best-effort leave announcement for the open
    /// document, then unconditionally stop the connection task and close
    /// the transport. Terminal — a closed client is not restarted.
    pub async fn close(&self, open_document: Option<&DocumentId>) {
        if let Some(document_id) = open_document {
            self.announce_leave(document_id).await;
        }
        let _ = self.shutdown_tx.send(true);
    }

    async fn run_loop(self: Arc<Self>) {
        let mut rx = match self.outbound_rx.lock().await.take() {
            Some(rx) => rx,
            None => return,
        };
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            self.set_state(ChannelState::Connecting);
            match self.establish().await {
                Ok(ws) => {
                    self.set_state(ChannelState::Connected);
                    info!(url = %self.config.url, "Presence channel connected");
                    self.drive(ws, &mut rx, &mut shutdown_rx).await;
                    self.set_state(ChannelState::Disconnected);
                    info!("Presence channel disconnected");
                }
                Err(e) => {
                    self.set_state(ChannelState::Disconnected);
                    debug!(error = %e, "Presence connect attempt failed");
                }
            }

            if *shutdown_rx.borrow() {
                break;
            }

            // Flat retry delay. State is rebuilt by a fresh join after
            // reconnect; nothing is replayed.
            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                _ = shutdown_rx.changed() => {}
            }
        }

        self.set_state(ChannelState::Disconnected);
        debug!("Presence client task ended");
    }

    async fn establish(&self) -> Result<WsStream, AppError> {
        let mut request = self
            .config
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| AppError::configuration(format!("Invalid presence URL: {e}")))?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.identity.token))
            .map_err(|e| AppError::authentication(format!("Invalid credential: {e}")))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (ws, _) = connect_async(request)
            .await
            .map_err(|e| AppError::external(format!("Presence handshake failed: {e}")))?;
        Ok(ws)
    }

    async fn drive(
        &self,
        ws: WsStream,
        rx: &mut mpsc::Receiver<String>,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) {
        // Anything still queued belongs to a previous connection and is
        // discarded, never replayed.
        while rx.try_recv().is_ok() {}

        let (mut sink, mut stream) = ws.split();

        loop {
            tokio::select! {
                outbound = rx.recv() => match outbound {
                    Some(text) => {
                        if let Err(e) = sink.send(Message::text(text)).await {
                            warn!(error = %e, "Presence send failed");
                            break;
                        }
                    }
                    None => break,
                },
                inbound = stream.next() => match inbound {
                    Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str()),
                    Some(Ok(Message::Close(_))) | None => break,
                    // Pings are answered by the transport layer.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Presence transport error");
                        break;
                    }
                },
                _ = shutdown_rx.changed() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    fn handle_frame(&self, raw: &str) {
        let event = match serializer::deserialize_event(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Dropping malformed presence event");
                return;
            }
        };

        if let Ok(handler) = self.handler.read() {
            if let Some(handler) = handler.as_ref() {
                handler(&event);
            }
        }

        self.roster.apply_event(&event);
    }

    fn set_state(&self, state: ChannelState) {
        if let Ok(mut slot) = self.state.write() {
            *slot = state;
        }
    }
}

#[async_trait]
impl EventSink for PresenceClient {
    async fn publish_event(&self, event: &PresenceEvent) {
        let state = self.state();
        if state != ChannelState::Connected {
            warn!(
                state = %state,
                event = event.message_type.as_str(),
                "Presence publish dropped; channel not ready"
            );
            return;
        }

        match serializer::serialize_event(event) {
            Ok(text) => {
                if let Err(e) = self.outbound_tx.try_send(text) {
                    warn!(error = %e, "Presence publish dropped; queue unavailable");
                }
            }
            Err(e) => warn!(error = %e, "Presence publish dropped; serialization failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(token: &str) -> ClientIdentity {
        ClientIdentity {
            user_id: UserId::new("u1"),
            username: "ada".to_string(),
            email: None,
            token: token.to_string(),
        }
    }

    fn config() -> PresenceClientConfig {
        PresenceClientConfig {
            url: "ws://localhost:9".to_string(),
            reconnect_delay: Duration::from_millis(10),
            channel_buffer_size: 8,
        }
    }

    #[tokio::test]
    async fn test_publish_before_connect_drops_without_queueing() {
        let client = PresenceClient::new(config(), identity("tok"));
        assert_eq!(client.state(), ChannelState::Disconnected);

        let doc = DocumentId::new("doc-1");
        client.announce_join(&doc).await;
        client.announce_leave(&doc).await;
        client.toggle_block(&doc, &UserId::new("u2")).await;

        // Nothing reached the outbound queue and no roster entry appeared.
        let mut rx = client.outbound_rx.lock().await.take().expect("receiver");
        assert!(rx.try_recv().is_err());
        assert!(client.document_readers(&doc).is_empty());
    }

    #[tokio::test]
    async fn test_connect_requires_identity_and_credential() {
        let client = Arc::new(PresenceClient::new(config(), identity("")));
        let err = client.connect().expect_err("must refuse");
        assert_eq!(err.kind, deepsearch_core::error::ErrorKind::Authentication);
        assert_eq!(client.state(), ChannelState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_twice_is_rejected() {
        let client = Arc::new(PresenceClient::new(config(), identity("tok")));
        client.connect().expect("first start");
        assert!(client.connect().is_err());
        client.close(None).await;
    }

    #[tokio::test]
    async fn test_close_without_connect_does_not_panic() {
        let client = PresenceClient::new(config(), identity("tok"));
        client.close(Some(&DocumentId::new("doc-1"))).await;
        assert_eq!(client.state(), ChannelState::Disconnected);
    }

    #[tokio::test]
    async fn test_inbound_frames_reconcile_roster() {
        let client = PresenceClient::new(config(), identity("tok"));
        let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        {
            let seen = seen.clone();
            client.set_event_handler(Arc::new(move |_event| {
                seen.fetch_add(1, Ordering::SeqCst);
            }));
        }

        client.handle_frame(
            r#"{"senderId":"u2","messageType":"viewer-joined","documentId":"doc-1",
               "user":{"id":"u2","username":"grace","readTime":0,
                       "lastAccessed":"2026-01-01T00:00:00Z","isBlocked":false,
                       "documentId":"doc-1"}}"#,
        );
        client.handle_frame("not json at all");

        let doc = DocumentId::new("doc-1");
        assert_eq!(client.document_readers(&doc).len(), 1);
        assert!(client.has_unblocked_active_readers(&doc));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        client.handle_frame(r#"{"senderId":"u2","messageType":"viewer-left","documentId":"doc-1"}"#);
        assert!(client.document_readers(&doc).is_empty());
    }
}
