//! Per-connection handle shared between the socket task and the manager.

use std::fmt;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use deepsearch_core::types::UserId;

/// Unique identifier for one WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A frame queued for delivery on one connection.
#[derive(Debug, Clone)]
pub enum WireFrame {
    /// A serialized presence event envelope.
    Event(String),
    /// A protocol-level keepalive ping.
    Ping,
}

/// Shared state for one live connection.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Connection id.
    pub id: ConnectionId,
    /// Authenticated user this connection belongs to.
    pub user_id: UserId,
    /// Username at connect time.
    pub username: String,
    sender: mpsc::Sender<WireFrame>,
    open: AtomicBool,
    closed_tx: watch::Sender<bool>,
    last_seen: RwLock<DateTime<Utc>>,
}

impl ConnectionHandle {
    /// Create a handle wrapping the connection's outbound queue.
    pub fn new(user_id: UserId, username: String, sender: mpsc::Sender<WireFrame>) -> Self {
        let (closed_tx, _) = watch::channel(false);
        Self {
            id: ConnectionId::new(),
            user_id,
            username,
            sender,
            open: AtomicBool::new(true),
            closed_tx,
            last_seen: RwLock::new(Utc::now()),
        }
    }

    /// Queue a frame for delivery. Returns `false` when the connection is
    /// closed or its queue is gone; the frame is dropped, never retried.
    pub async fn send(&self, frame: WireFrame) -> bool {
        if !self.is_open() {
            return false;
        }
        if self.sender.send(frame).await.is_err() {
            self.mark_closed();
            return false;
        }
        true
    }

    /// Record inbound activity (text frames, pongs).
    pub fn touch(&self) {
        if let Ok(mut last_seen) = self.last_seen.write() {
            *last_seen = Utc::now();
        }
    }

    /// Milliseconds since the last inbound activity.
    pub fn millis_since_seen(&self) -> i64 {
        self.last_seen
            .read()
            .map(|last_seen| (Utc::now() - *last_seen).num_milliseconds())
            .unwrap_or(i64::MAX)
    }

    /// Whether the connection is still usable.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Mark the connection closed and wake any task waiting on
    /// [`Self::wait_closed`].
    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
        let _ = self.closed_tx.send(true);
    }

    /// Wait until the connection is marked closed.
    pub async fn wait_closed(&self) {
        let mut rx = self.closed_tx.subscribe();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_after_close_is_dropped() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(UserId::new("u1"), "ada".to_string(), tx);

        assert!(handle.send(WireFrame::Ping).await);
        handle.mark_closed();
        assert!(!handle.send(WireFrame::Ping).await);

        // Only the pre-close frame made it into the queue.
        assert!(matches!(rx.recv().await, Some(WireFrame::Ping)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wait_closed_returns_once_marked() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = std::sync::Arc::new(ConnectionHandle::new(
            UserId::new("u1"),
            "ada".to_string(),
            tx,
        ));

        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait_closed().await })
        };
        handle.mark_closed();
        waiter.await.expect("waiter completes");
    }
}
