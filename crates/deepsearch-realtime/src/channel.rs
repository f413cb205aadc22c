//! Topic registry — private per-user inbox topics.
//!
//! Every event addressed to a user is delivered on that user's private
//! topic; each connection is subscribed to its own user's topic when it
//! registers and unsubscribed from everything when it goes away.

use dashmap::{DashMap, DashSet};

use deepsearch_core::types::UserId;

use crate::connection::handle::ConnectionId;

/// Name of a user's private inbox topic.
pub fn user_topic(user_id: &UserId) -> String {
    format!("user:{user_id}")
}

/// Registry of topic subscriptions with a reverse index per connection.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    subscribers: DashMap<String, DashSet<ConnectionId>>,
    by_connection: DashMap<ConnectionId, DashSet<String>>,
}

impl TopicRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            by_connection: DashMap::new(),
        }
    }

    /// Subscribe a connection to a topic.
    pub fn subscribe(&self, topic: &str, conn_id: ConnectionId) {
        self.subscribers
            .entry(topic.to_string())
            .or_default()
            .insert(conn_id);
        self.by_connection
            .entry(conn_id)
            .or_default()
            .insert(topic.to_string());
    }

    /// Unsubscribe a connection from one topic, dropping the topic when it
    /// has no subscribers left.
    pub fn unsubscribe(&self, topic: &str, conn_id: &ConnectionId) {
        if let Some(subs) = self.subscribers.get(topic) {
            subs.remove(conn_id);
            let empty = subs.is_empty();
            drop(subs);
            if empty {
                self.subscribers.remove_if(topic, |_, subs| subs.is_empty());
            }
        }
        if let Some(topics) = self.by_connection.get(conn_id) {
            topics.remove(topic);
        }
    }

    /// Unsubscribe a connection from every topic it was on.
    pub fn unsubscribe_all(&self, conn_id: &ConnectionId) {
        let Some((_, topics)) = self.by_connection.remove(conn_id) else {
            return;
        };
        for topic in topics.iter() {
            if let Some(subs) = self.subscribers.get(topic.key()) {
                subs.remove(conn_id);
                let empty = subs.is_empty();
                drop(subs);
                if empty {
                    self.subscribers
                        .remove_if(topic.key(), |_, subs| subs.is_empty());
                }
            }
        }
    }

    /// All subscriber connection ids for a topic.
    pub fn subscribers(&self, topic: &str) -> Vec<ConnectionId> {
        self.subscribers
            .get(topic)
            .map(|subs| subs.iter().map(|id| *id).collect())
            .unwrap_or_default()
    }

    /// Number of topics with at least one subscriber.
    pub fn topic_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_and_unsubscribe_all() {
        let topics = TopicRegistry::new();
        let conn = ConnectionId::new();
        let topic = user_topic(&UserId::new("u1"));

        topics.subscribe(&topic, conn);
        assert_eq!(topics.subscribers(&topic), vec![conn]);

        topics.unsubscribe_all(&conn);
        assert!(topics.subscribers(&topic).is_empty());
        assert_eq!(topics.topic_count(), 0);
    }

    #[test]
    fn test_empty_topics_are_dropped() {
        let topics = TopicRegistry::new();
        let first = ConnectionId::new();
        let second = ConnectionId::new();
        topics.subscribe("user:u1", first);
        topics.subscribe("user:u1", second);

        topics.unsubscribe("user:u1", &first);
        assert_eq!(topics.topic_count(), 1);
        topics.unsubscribe("user:u1", &second);
        assert_eq!(topics.topic_count(), 0);
    }
}
