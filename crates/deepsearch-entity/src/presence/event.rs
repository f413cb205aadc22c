//! Presence event envelope — the single message shape on the channel.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use deepsearch_core::types::{DocumentId, UserId};

use super::reader::Reader;

/// The closed set of presence event types.
///
/// Unrecognized wire values map to [`EventType::Unknown`] and are dropped
/// by receivers rather than rejected, so newer peers can ship new event
/// types without breaking older ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A user opened a document viewer.
    ViewerJoined,
    /// A user closed a document viewer.
    ViewerLeft,
    /// A privileged viewer flipped a reader's blocked flag.
    BlockToggled,
    /// Any event type this build does not recognize.
    Unknown,
}

impl EventType {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewerJoined => "viewer-joined",
            Self::ViewerLeft => "viewer-left",
            Self::BlockToggled => "block-toggled",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a wire value, mapping anything unrecognized to `Unknown`.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "viewer-joined" => Self::ViewerJoined,
            "viewer-left" => Self::ViewerLeft,
            "block-toggled" => Self::BlockToggled,
            _ => Self::Unknown,
        }
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&s))
    }
}

/// The JSON envelope carried on the presence channel, both directions.
///
/// One shape for every event type; optional fields are simply absent when
/// an event does not use them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    /// Identity of the originating user.
    pub sender_id: UserId,
    /// Addressee, for events targeting a specific user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<UserId>,
    /// Event discriminator.
    pub message_type: EventType,
    /// Document the event concerns; absent for global events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
    /// Embedded reader snapshot (join events, block targets).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Reader>,
    /// Full roster snapshot (sent to a joiner).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<Reader>>,
}

impl PresenceEvent {
    /// A user started viewing a document.
    pub fn viewer_joined(sender_id: UserId, document_id: DocumentId, reader: Reader) -> Self {
        Self {
            sender_id,
            receiver_id: None,
            message_type: EventType::ViewerJoined,
            document_id: Some(document_id),
            user: Some(reader),
            users: None,
        }
    }

    /// Roster snapshot delivered to a user who just joined.
    pub fn roster_snapshot(
        sender_id: UserId,
        document_id: DocumentId,
        readers: Vec<Reader>,
    ) -> Self {
        Self {
            sender_id,
            receiver_id: None,
            message_type: EventType::ViewerJoined,
            document_id: Some(document_id),
            user: None,
            users: Some(readers),
        }
    }

    /// A user stopped viewing a document.
    pub fn viewer_left(sender_id: UserId, document_id: DocumentId) -> Self {
        Self {
            sender_id,
            receiver_id: None,
            message_type: EventType::ViewerLeft,
            document_id: Some(document_id),
            user: None,
            users: None,
        }
    }

    /// A privileged viewer toggled a reader's blocked flag. The target's
    /// roster snapshot rides along when the sender has one.
    pub fn block_toggled(
        sender_id: UserId,
        document_id: DocumentId,
        target_id: UserId,
        target: Option<Reader>,
    ) -> Self {
        Self {
            sender_id,
            receiver_id: Some(target_id),
            message_type: EventType::BlockToggled,
            document_id: Some(document_id),
            user: target,
            users: None,
        }
    }

    /// The user a block-toggle event targets, from the addressee field or
    /// the embedded snapshot.
    pub fn target_id(&self) -> Option<&UserId> {
        self.receiver_id
            .as_ref()
            .or_else(|| self.user.as_ref().map(|u| &u.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_event_type_wire_values() {
        assert_eq!(EventType::ViewerJoined.as_str(), "viewer-joined");
        assert_eq!(EventType::from_wire("viewer-left"), EventType::ViewerLeft);
        assert_eq!(EventType::from_wire("block-toggled"), EventType::BlockToggled);
    }

    #[test]
    fn test_unknown_event_type_is_dropped_not_rejected() {
        let json = r#"{"senderId": "u1", "messageType": "cursor-moved"}"#;
        let event: PresenceEvent = serde_json::from_str(json).expect("deserialize");
        assert_eq!(event.message_type, EventType::Unknown);
    }

    #[test]
    fn test_envelope_wire_shape() {
        let reader = Reader::new(
            UserId::new("u1"),
            "ada",
            None,
            DocumentId::new("doc-1"),
            Utc::now(),
        );
        let event =
            PresenceEvent::viewer_joined(UserId::new("u1"), DocumentId::new("doc-1"), reader);
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["senderId"], "u1");
        assert_eq!(json["messageType"], "viewer-joined");
        assert_eq!(json["documentId"], "doc-1");
        assert!(json.get("receiverId").is_none());
        assert!(json.get("users").is_none());
    }

    #[test]
    fn test_block_toggled_addresses_target() {
        let target = Reader::new(
            UserId::new("u2"),
            "grace",
            None,
            DocumentId::new("doc-1"),
            Utc::now(),
        );
        let event = PresenceEvent::block_toggled(
            UserId::new("u1"),
            DocumentId::new("doc-1"),
            UserId::new("u2"),
            Some(target),
        );
        assert_eq!(event.receiver_id, Some(UserId::new("u2")));
        assert_eq!(event.target_id(), Some(&UserId::new("u2")));
        assert_eq!(event.user.unwrap().id, UserId::new("u2"));
    }

    #[test]
    fn test_target_id_falls_back_to_snapshot() {
        let target = Reader::new(
            UserId::new("u3"),
            "lin",
            None,
            DocumentId::new("doc-2"),
            Utc::now(),
        );
        let mut event = PresenceEvent::block_toggled(
            UserId::new("u1"),
            DocumentId::new("doc-2"),
            UserId::new("u3"),
            Some(target),
        );
        event.receiver_id = None;
        assert_eq!(event.target_id(), Some(&UserId::new("u3")));
    }
}
