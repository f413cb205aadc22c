//! Connection state machine for the presence client.

use std::fmt;

/// Lifecycle states of the client's single push connection.
///
/// `Disconnected → Connecting → Connected → Disconnected`, with
/// `Connecting` recurring indefinitely through automatic retry until the
/// owner tears the client down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No transport; either never connected, lost, or torn down.
    Disconnected,
    /// A handshake is in flight.
    Connecting,
    /// The transport is up and publishes will be sent.
    Connected,
}

impl ChannelState {
    /// Lowercase label for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
