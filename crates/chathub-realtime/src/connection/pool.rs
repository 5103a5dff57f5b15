//! Connection pool — tracks all live connections, indexed by ID and username.

use std::sync::Arc;

use dashmap::DashMap;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe pool of all live connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// Username → connection IDs (one user may hold several connections).
    by_user: DashMap<String, Vec<ConnectionId>>,
    /// Connection ID → connection handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_user
            .entry(handle.username.clone())
            .or_default()
            .push(handle.id);
        self.by_id.insert(handle.id, handle);
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        if let Some(mut ids) = self.by_user.get_mut(&handle.username) {
            ids.retain(|id| id != conn_id);
            if ids.is_empty() {
                drop(ids);
                self.by_user.remove(&handle.username);
            }
        }
        Some(handle)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Snapshot of every live connection.
    pub fn all(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Returns total number of connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of distinct connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::registry::ChannelRegistry;
    use crate::metrics::EngineMetrics;

    fn handle(username: &str) -> Arc<ConnectionHandle> {
        let metrics = Arc::new(EngineMetrics::new());
        let registry = Arc::new(ChannelRegistry::new(4, metrics.clone()));
        ConnectionHandle::new(username, registry, metrics, 4).0
    }

    #[tokio::test]
    async fn test_add_and_remove() {
        let pool = ConnectionPool::new();
        let first = handle("alice");
        let second = handle("alice");
        let other = handle("bob");
        pool.add(first.clone());
        pool.add(second.clone());
        pool.add(other.clone());

        assert_eq!(pool.connection_count(), 3);
        assert_eq!(pool.user_count(), 2);

        assert!(pool.remove(&first.id).is_some());
        assert!(pool.remove(&first.id).is_none());
        assert_eq!(pool.connection_count(), 2);
        assert_eq!(pool.user_count(), 2);

        pool.remove(&second.id);
        assert_eq!(pool.user_count(), 1);
        assert!(pool.get(&other.id).is_some());
    }
}
