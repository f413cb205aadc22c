//! # deepsearch-realtime
//!
//! The presence channel: gives every open document-viewer tab a live view
//! of who else is viewing the same document, with a privileged
//! block/unblock toggle mirrored to peers. Provides:
//!
//! - Per-document reader rosters with idempotent upsert semantics
//! - Server-side connection management with per-user inbox topics,
//!   heartbeat, and fan-out of presence events
//! - A reconnecting client with an explicit connection state machine and
//!   fire-and-forget publishing
//!
//! Delivery is deliberately lossy: rosters are advisory UI state, events
//! are never acknowledged, retried, or replayed, and a stale roster is an
//! accepted outcome.

pub mod channel;
pub mod client;
pub mod connection;
pub mod message;
pub mod roster;
pub mod server;

pub use client::{ClientIdentity, PresenceClient, PresenceClientConfig};
pub use connection::manager::ConnectionManager;
pub use message::EventSink;
pub use roster::RosterRegistry;
pub use server::PresenceEngine;
