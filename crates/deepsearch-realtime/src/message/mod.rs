//! Wire handling for presence events: serialization, validation, and the
//! narrow publishing seam.

pub mod serializer;
pub mod validator;

use async_trait::async_trait;

use deepsearch_entity::presence::PresenceEvent;

/// The narrow outbound interface of the presence channel.
///
/// Publishing is fire-and-forget by design: no acknowledgement, no retry,
/// no result for the caller. Keeping callers behind this trait means a
/// future implementation could add delivery guarantees without touching
/// them.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish one event. Failures are logged, never returned.
    async fn publish_event(&self, event: &PresenceEvent);
}
