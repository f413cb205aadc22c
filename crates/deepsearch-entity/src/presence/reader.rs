//! Reader records — ephemeral per-(document, user) viewing state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use deepsearch_core::types::{DocumentId, UserId};

/// One user's viewing state for one document.
///
/// Advisory UI state only: rosters are rebuilt from scratch whenever a
/// viewer opens, and nothing here is persisted server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reader {
    /// Subject id of the reading user.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Minutes of accumulated reading time. Client-reported and
    /// monotonically non-decreasing; never authoritative.
    #[serde(default)]
    pub read_time: u32,
    /// Last known activity.
    pub last_accessed: DateTime<Utc>,
    /// Whether a privileged viewer has blocked this reader.
    #[serde(default)]
    pub is_blocked: bool,
    /// Document this record is scoped to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
}

impl Reader {
    /// Create a fresh record for a user opening a document.
    pub fn new(
        id: UserId,
        username: impl Into<String>,
        email: Option<String>,
        document_id: DocumentId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            email,
            read_time: 0,
            last_accessed: now,
            is_blocked: false,
            document_id: Some(document_id),
        }
    }

    /// Merge a newer snapshot of the same reader into this record.
    ///
    /// Latest received fields win, except `read_time`, which only moves
    /// forward.
    pub fn merge(&mut self, incoming: Reader) {
        self.username = incoming.username;
        if incoming.email.is_some() {
            self.email = incoming.email;
        }
        self.read_time = self.read_time.max(incoming.read_time);
        self.last_accessed = incoming.last_accessed;
        self.is_blocked = incoming.is_blocked;
        if incoming.document_id.is_some() {
            self.document_id = incoming.document_id;
        }
    }

    /// Flip the blocked flag, returning the new value.
    pub fn toggle_blocked(&mut self) -> bool {
        self.is_blocked = !self.is_blocked;
        self.is_blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(read_time: u32) -> Reader {
        Reader {
            id: UserId::new("u1"),
            username: "ada".to_string(),
            email: Some("ada@example.com".to_string()),
            read_time,
            last_accessed: Utc::now(),
            is_blocked: false,
            document_id: Some(DocumentId::new("doc-1")),
        }
    }

    #[test]
    fn test_wire_format() {
        let r = reader(5);
        let json = serde_json::to_value(&r).expect("serialize");
        assert!(json.get("readTime").is_some());
        assert!(json.get("lastAccessed").is_some());
        assert!(json.get("isBlocked").is_some());
        assert!(json.get("documentId").is_some());
    }

    #[test]
    fn test_merge_read_time_never_regresses() {
        let mut existing = reader(10);
        let mut incoming = reader(4);
        incoming.username = "ada.l".to_string();
        existing.merge(incoming);
        assert_eq!(existing.read_time, 10);
        assert_eq!(existing.username, "ada.l");
    }

    #[test]
    fn test_merge_takes_latest_block_state() {
        let mut existing = reader(1);
        existing.is_blocked = true;
        let incoming = reader(2);
        existing.merge(incoming);
        assert!(!existing.is_blocked);
        assert_eq!(existing.read_time, 2);
    }

    #[test]
    fn test_toggle_blocked_is_involutive() {
        let mut r = reader(0);
        let original = r.is_blocked;
        r.toggle_blocked();
        r.toggle_blocked();
        assert_eq!(r.is_blocked, original);
    }
}
