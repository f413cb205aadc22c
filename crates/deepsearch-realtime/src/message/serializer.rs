//! JSON serialization for presence event envelopes.

use deepsearch_entity::presence::PresenceEvent;

/// Serialize an event envelope to its wire form.
pub fn serialize_event(event: &PresenceEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

/// Deserialize an inbound envelope from its wire form.
pub fn deserialize_event(text: &str) -> Result<PresenceEvent, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepsearch_core::types::{DocumentId, UserId};

    #[test]
    fn test_roundtrip() {
        let event = PresenceEvent::viewer_left(UserId::new("u1"), DocumentId::new("doc-1"));
        let text = serialize_event(&event).expect("serialize");
        let parsed = deserialize_event(&text).expect("deserialize");
        assert_eq!(parsed.sender_id, UserId::new("u1"));
        assert_eq!(parsed.document_id, Some(DocumentId::new("doc-1")));
    }
}
