//! Connection pool — all live connections with a per-user index.

use std::sync::Arc;

use dashmap::DashMap;

use deepsearch_core::types::UserId;

use super::handle::{ConnectionHandle, ConnectionId};

/// Holds every live connection, indexed by connection id and by user.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    connections: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    by_user: DashMap<UserId, Vec<ConnectionId>>,
}

impl ConnectionPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            by_user: DashMap::new(),
        }
    }

    /// Add a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_user
            .entry(handle.user_id.clone())
            .or_default()
            .push(handle.id);
        self.connections.insert(handle.id, handle);
    }

    /// Remove a connection, returning its handle.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.connections.remove(conn_id)?;

        if let Some(mut conns) = self.by_user.get_mut(&handle.user_id) {
            conns.retain(|id| id != conn_id);
            let empty = conns.is_empty();
            drop(conns);
            if empty {
                self.by_user
                    .remove_if(&handle.user_id, |_, conns| conns.is_empty());
            }
        }

        Some(handle)
    }

    /// Look up one connection.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.connections.get(conn_id).map(|h| h.value().clone())
    }

    /// All connections for one user, oldest first.
    pub fn user_connections(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|conns| {
                conns
                    .iter()
                    .filter_map(|id| self.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All live connections.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections.iter().map(|h| h.value().clone()).collect()
    }

    /// Total connection count.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Number of distinct connected users.
    pub fn unique_users(&self) -> usize {
        self.by_user.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn handle(user: &str) -> Arc<ConnectionHandle> {
        let (tx, _rx) = mpsc::channel(1);
        Arc::new(ConnectionHandle::new(
            UserId::new(user),
            format!("user-{user}"),
            tx,
        ))
    }

    #[test]
    fn test_user_index_tracks_multiple_tabs() {
        let pool = ConnectionPool::new();
        let first = handle("u1");
        let second = handle("u1");
        pool.add(first.clone());
        pool.add(second.clone());

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.unique_users(), 1);
        assert_eq!(pool.user_connections(&UserId::new("u1")).len(), 2);

        pool.remove(&first.id);
        assert_eq!(pool.user_connections(&UserId::new("u1")).len(), 1);
        assert_eq!(pool.unique_users(), 1);

        pool.remove(&second.id);
        assert_eq!(pool.unique_users(), 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_remove_unknown_connection_is_noop() {
        let pool = ConnectionPool::new();
        assert!(pool.remove(&ConnectionId::new()).is_none());
    }
}
