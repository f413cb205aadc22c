//! Ping/pong heartbeat for WebSocket keepalive.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{debug, warn};

use deepsearch_core::config::realtime::RealtimeConfig;

use super::handle::{ConnectionHandle, WireFrame};

/// Heartbeat timing parameters.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings.
    pub ping_interval: Duration,
    /// Grace period on top of the interval before a silent connection is
    /// considered dead.
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds),
            ping_timeout: Duration::from_secs(config.ping_timeout_seconds),
        }
    }
}

/// Run the heartbeat loop for one connection.
///
/// Sends periodic protocol pings and marks the connection closed when no
/// inbound activity (frames or pongs) arrives within the allowed window.
/// Marking closed wakes the socket task, which tears the connection down.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let allowed_silence = (config.ping_interval + config.ping_timeout).as_millis() as i64;
    let mut interval = time::interval(config.ping_interval);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    // The first tick fires immediately; skip it so a fresh connection is
    // not pinged before it has settled.
    interval.tick().await;

    loop {
        interval.tick().await;

        if !handle.is_open() {
            break;
        }

        if handle.millis_since_seen() > allowed_silence {
            warn!(
                conn_id = %handle.id,
                silent_ms = handle.millis_since_seen(),
                "Heartbeat timeout, closing connection"
            );
            handle.mark_closed();
            break;
        }

        if !handle.send(WireFrame::Ping).await {
            debug!(conn_id = %handle.id, "Ping send failed, closing connection");
            handle.mark_closed();
            break;
        }
    }

    debug!(conn_id = %handle.id, "Heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepsearch_core::types::UserId;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_heartbeat_closes_silent_connection() {
        let (tx, _rx) = mpsc::channel(16);
        let handle = Arc::new(ConnectionHandle::new(
            UserId::new("u1"),
            "ada".to_string(),
            tx,
        ));

        let config = HeartbeatConfig {
            ping_interval: Duration::from_millis(20),
            ping_timeout: Duration::from_millis(20),
        };

        let task = tokio::spawn(run_heartbeat(handle.clone(), config));

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("heartbeat must terminate")
            .expect("heartbeat task");
        assert!(!handle.is_open());
    }

    #[tokio::test]
    async fn test_heartbeat_stops_when_connection_closes() {
        let (tx, _rx) = mpsc::channel(16);
        let handle = Arc::new(ConnectionHandle::new(
            UserId::new("u1"),
            "ada".to_string(),
            tx,
        ));

        let config = HeartbeatConfig {
            ping_interval: Duration::from_millis(20),
            ping_timeout: Duration::from_secs(60),
        };

        let task = tokio::spawn(run_heartbeat(handle.clone(), config));
        handle.mark_closed();

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("heartbeat must terminate")
            .expect("heartbeat task");
    }
}
