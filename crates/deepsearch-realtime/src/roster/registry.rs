//! Roster registry — the ephemeral set of reader records known locally.

use dashmap::DashMap;
use tracing::warn;

use deepsearch_core::types::{DocumentId, UserId};
use deepsearch_entity::presence::{EventType, PresenceEvent, Reader};

/// Registry of reader records, keyed by `(document, reader)`.
///
/// At most one record exists per key; joins merge into the existing record
/// rather than duplicating. Single logical writer (the event handler), so
/// no ordering discipline beyond the map's own sharding is needed. Nothing
/// here is persisted; every viewer rebuilds its roster from scratch.
#[derive(Debug, Default)]
pub struct RosterRegistry {
    readers: DashMap<(DocumentId, UserId), Reader>,
}

impl RosterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            readers: DashMap::new(),
        }
    }

    /// Insert or merge a reader record.
    ///
    /// Returns the stored record, or `None` when the record carries no
    /// document id and therefore cannot be keyed.
    pub fn upsert(&self, reader: Reader) -> Option<Reader> {
        let Some(document_id) = reader.document_id.clone() else {
            warn!(reader_id = %reader.id, "Dropping reader record without document id");
            return None;
        };

        let key = (document_id, reader.id.clone());
        let mut entry = self
            .readers
            .entry(key)
            .and_modify(|existing| existing.merge(reader.clone()))
            .or_insert(reader);
        Some(entry.value_mut().clone())
    }

    /// Remove a reader record. A no-op returning `None` when absent.
    pub fn remove(&self, document_id: &DocumentId, reader_id: &UserId) -> Option<Reader> {
        self.readers
            .remove(&(document_id.clone(), reader_id.clone()))
            .map(|(_, reader)| reader)
    }

    /// Look up one reader record.
    pub fn get(&self, document_id: &DocumentId, reader_id: &UserId) -> Option<Reader> {
        self.readers
            .get(&(document_id.clone(), reader_id.clone()))
            .map(|r| r.value().clone())
    }

    /// Flip a reader's blocked flag, returning the updated record.
    /// `None` when no matching record exists.
    pub fn toggle_block(&self, document_id: &DocumentId, reader_id: &UserId) -> Option<Reader> {
        self.readers
            .get_mut(&(document_id.clone(), reader_id.clone()))
            .map(|mut r| {
                r.value_mut().toggle_blocked();
                r.value().clone()
            })
    }

    /// All reader records for one document. Never returns a record scoped
    /// to a different document.
    pub fn document_readers(&self, document_id: &DocumentId) -> Vec<Reader> {
        self.readers
            .iter()
            .filter(|r| &r.key().0 == document_id)
            .map(|r| r.value().clone())
            .collect()
    }

    /// Whether any reader of the document is currently not blocked.
    pub fn has_unblocked_active_readers(&self, document_id: &DocumentId) -> bool {
        self.readers
            .iter()
            .any(|r| &r.key().0 == document_id && !r.value().is_blocked)
    }

    /// Remove every record for one user, across all documents. Returns the
    /// documents the user was removed from.
    pub fn remove_reader_everywhere(&self, reader_id: &UserId) -> Vec<DocumentId> {
        let keys: Vec<(DocumentId, UserId)> = self
            .readers
            .iter()
            .filter(|r| &r.key().1 == reader_id)
            .map(|r| r.key().clone())
            .collect();

        keys.into_iter()
            .filter_map(|key| self.readers.remove(&key).map(|_| key.0))
            .collect()
    }

    /// Apply one inbound presence event to this roster.
    ///
    /// This is the receiver-side reconciliation shared by server and
    /// client: joins upsert (including bulk snapshots), leaves remove,
    /// block toggles flip the matching record. Unknown event types are
    /// dropped silently for forward compatibility.
    pub fn apply_event(&self, event: &PresenceEvent) {
        match event.message_type {
            EventType::ViewerJoined => {
                if let Some(users) = &event.users {
                    for reader in users {
                        self.upsert(self.scoped(reader, event));
                    }
                }
                if let Some(user) = &event.user {
                    self.upsert(self.scoped(user, event));
                }
            }
            EventType::ViewerLeft => {
                if let Some(document_id) = &event.document_id {
                    self.remove(document_id, &event.sender_id);
                }
            }
            EventType::BlockToggled => {
                if let (Some(document_id), Some(target_id)) =
                    (&event.document_id, event.target_id())
                {
                    self.toggle_block(document_id, target_id);
                }
            }
            EventType::Unknown => {}
        }
    }

    /// Total number of records across all documents.
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    /// Whether the roster holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Copy a reader, filling a missing document scope from the envelope.
    fn scoped(&self, reader: &Reader, event: &PresenceEvent) -> Reader {
        let mut reader = reader.clone();
        if reader.document_id.is_none() {
            reader.document_id = event.document_id.clone();
        }
        reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reader(id: &str, doc: &str) -> Reader {
        Reader::new(
            UserId::new(id),
            format!("user-{id}"),
            None,
            DocumentId::new(doc),
            Utc::now(),
        )
    }

    #[test]
    fn test_repeated_joins_keep_one_record_per_key() {
        let roster = RosterRegistry::new();
        for read_time in [0u32, 3, 7] {
            let mut r = reader("u1", "doc-1");
            r.read_time = read_time;
            roster.upsert(r);
        }
        let readers = roster.document_readers(&DocumentId::new("doc-1"));
        assert_eq!(readers.len(), 1);
        assert_eq!(readers[0].read_time, 7);
    }

    #[test]
    fn test_upsert_merges_latest_fields() {
        let roster = RosterRegistry::new();
        roster.upsert(reader("u1", "doc-1"));
        let mut updated = reader("u1", "doc-1");
        updated.username = "renamed".to_string();
        roster.upsert(updated);
        let stored = roster
            .get(&DocumentId::new("doc-1"), &UserId::new("u1"))
            .expect("record");
        assert_eq!(stored.username, "renamed");
    }

    #[test]
    fn test_upsert_without_document_is_dropped() {
        let roster = RosterRegistry::new();
        let mut r = reader("u1", "doc-1");
        r.document_id = None;
        assert!(roster.upsert(r).is_none());
        assert!(roster.is_empty());
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let roster = RosterRegistry::new();
        assert!(
            roster
                .remove(&DocumentId::new("doc-1"), &UserId::new("ghost"))
                .is_none()
        );
    }

    #[test]
    fn test_remove_deletes_the_record() {
        let roster = RosterRegistry::new();
        roster.upsert(reader("u1", "doc-1"));
        assert!(
            roster
                .remove(&DocumentId::new("doc-1"), &UserId::new("u1"))
                .is_some()
        );
        assert!(
            roster
                .get(&DocumentId::new("doc-1"), &UserId::new("u1"))
                .is_none()
        );
    }

    #[test]
    fn test_toggle_block_is_involutive() {
        let roster = RosterRegistry::new();
        roster.upsert(reader("u1", "doc-1"));
        let doc = DocumentId::new("doc-1");
        let user = UserId::new("u1");

        let blocked = roster.toggle_block(&doc, &user).expect("record");
        assert!(blocked.is_blocked);
        let unblocked = roster.toggle_block(&doc, &user).expect("record");
        assert!(!unblocked.is_blocked);
    }

    #[test]
    fn test_toggle_block_missing_record_is_none() {
        let roster = RosterRegistry::new();
        assert!(
            roster
                .toggle_block(&DocumentId::new("doc-1"), &UserId::new("ghost"))
                .is_none()
        );
    }

    #[test]
    fn test_document_filter_never_leaks_other_documents() {
        let roster = RosterRegistry::new();
        roster.upsert(reader("u1", "doc-1"));
        roster.upsert(reader("u2", "doc-2"));
        roster.upsert(reader("u3", "doc-1"));

        let readers = roster.document_readers(&DocumentId::new("doc-1"));
        assert_eq!(readers.len(), 2);
        assert!(
            readers
                .iter()
                .all(|r| r.document_id == Some(DocumentId::new("doc-1")))
        );
    }

    #[test]
    fn test_same_user_in_two_documents_has_two_records() {
        let roster = RosterRegistry::new();
        roster.upsert(reader("u1", "doc-1"));
        roster.upsert(reader("u1", "doc-2"));
        assert_eq!(roster.len(), 2);

        let removed = roster.remove_reader_everywhere(&UserId::new("u1"));
        assert_eq!(removed.len(), 2);
        assert!(roster.is_empty());
    }

    #[test]
    fn test_has_unblocked_active_readers() {
        let roster = RosterRegistry::new();
        let doc = DocumentId::new("doc-1");
        assert!(!roster.has_unblocked_active_readers(&doc));

        roster.upsert(reader("u1", "doc-1"));
        assert!(roster.has_unblocked_active_readers(&doc));

        roster.toggle_block(&doc, &UserId::new("u1"));
        assert!(!roster.has_unblocked_active_readers(&doc));
    }

    #[test]
    fn test_apply_event_join_leave_roundtrip() {
        let roster = RosterRegistry::new();
        let doc = DocumentId::new("doc-1");
        let join = PresenceEvent::viewer_joined(
            UserId::new("u1"),
            doc.clone(),
            reader("u1", "doc-1"),
        );
        roster.apply_event(&join);
        assert_eq!(roster.document_readers(&doc).len(), 1);

        let leave = PresenceEvent::viewer_left(UserId::new("u1"), doc.clone());
        roster.apply_event(&leave);
        assert!(roster.document_readers(&doc).is_empty());
    }

    #[test]
    fn test_apply_event_snapshot_fills_document_scope() {
        let roster = RosterRegistry::new();
        let doc = DocumentId::new("doc-1");
        let mut unscoped = reader("u2", "doc-1");
        unscoped.document_id = None;
        let snapshot =
            PresenceEvent::roster_snapshot(UserId::new("u1"), doc.clone(), vec![unscoped]);
        roster.apply_event(&snapshot);
        let readers = roster.document_readers(&doc);
        assert_eq!(readers.len(), 1);
        assert_eq!(readers[0].document_id, Some(doc));
    }

    #[test]
    fn test_apply_event_unknown_is_ignored() {
        let roster = RosterRegistry::new();
        let event: PresenceEvent = serde_json::from_str(
            r#"{"senderId": "u1", "messageType": "cursor-moved", "documentId": "doc-1"}"#,
        )
        .expect("deserialize");
        roster.apply_event(&event);
        assert!(roster.is_empty());
    }
}
