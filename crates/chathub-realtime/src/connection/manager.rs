//! Connection manager — accepts authenticated transports and tracks their
//! lifecycle.

use std::fmt::Display;
use std::sync::Arc;

use futures::{Sink, Stream};
use tokio::task::JoinHandle;
use tracing::info;

use chathub_core::config::RealtimeConfig;

use crate::channel::registry::ChannelRegistry;
use crate::metrics::EngineMetrics;

use super::agent::{AgentConfig, ConnectionAgent};
use super::frame::Frame;
use super::handle::{ConnectionHandle, ConnectionInfo};
use super::pool::ConnectionPool;

/// Manages all live connections.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connection pool.
    pool: Arc<ConnectionPool>,
    /// Channel registry.
    channels: Arc<ChannelRegistry>,
    /// Metrics.
    metrics: Arc<EngineMetrics>,
    /// Per-connection limits.
    config: AgentConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: &RealtimeConfig,
        channels: Arc<ChannelRegistry>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new()),
            channels,
            metrics,
            config: AgentConfig::from(config),
        }
    }

    /// Starts an agent for an authenticated transport.
    ///
    /// The connection stays in the pool until its agent has fully stopped.
    pub fn accept<S, K, E>(
        &self,
        username: impl Into<String>,
        sink: K,
        stream: S,
    ) -> (Arc<ConnectionHandle>, JoinHandle<()>)
    where
        S: Stream<Item = Result<Frame, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
        K: Sink<Frame> + Unpin + Send + 'static,
        K::Error: Display + Send,
    {
        let agent = ConnectionAgent::new(
            username,
            self.channels.clone(),
            self.metrics.clone(),
            self.config,
            sink,
            stream,
        );
        let handle = agent.handle().clone();

        self.pool.add(handle.clone());
        self.metrics.connection_opened();
        info!(conn_id = %handle.id, username = %handle.username, "Connection registered");

        let pool = self.pool.clone();
        let metrics = self.metrics.clone();
        let conn_id = handle.id;
        let task = tokio::spawn(async move {
            agent.run().await;
            if pool.remove(&conn_id).is_some() {
                metrics.connection_closed();
            }
            info!(conn_id = %conn_id, "Connection unregistered");
        });

        (handle, task)
    }

    /// Signals every live connection to close. Returns how many were
    /// signalled; each agent finishes its own cleanup.
    pub fn close_all(&self) -> usize {
        let handles = self.pool.all();
        for handle in &handles {
            handle.close();
        }
        handles.len()
    }

    /// Snapshots of all live connections.
    pub async fn connections(&self) -> Vec<ConnectionInfo> {
        let mut infos = Vec::new();
        for handle in self.pool.all() {
            infos.push(handle.info().await);
        }
        infos
    }

    /// Returns total number of live connections.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns number of distinct connected users.
    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::channel::mpsc as transport;

    use super::*;

    #[tokio::test]
    async fn test_connection_unregistered_after_teardown() {
        let metrics = Arc::new(EngineMetrics::new());
        let registry = Arc::new(ChannelRegistry::new(4, metrics.clone()));
        let manager = ConnectionManager::new(&RealtimeConfig::default(), registry, metrics.clone());

        let (to_server, stream) = transport::unbounded::<Result<Frame, String>>();
        let (sink, _from_server) = transport::unbounded::<Frame>();
        let (handle, task) = manager.accept("alice", sink, stream);

        assert_eq!(manager.connection_count(), 1);
        assert_eq!(metrics.snapshot().connections_active, 1);
        assert_eq!(manager.connections().await[0].username, "alice");

        assert_eq!(manager.close_all(), 1);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("connection stops")
            .expect("task");

        assert!(handle.is_closed());
        assert_eq!(manager.connection_count(), 0);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connections_total, 1);
        assert_eq!(snapshot.connections_active, 0);
        drop(to_server);
    }
}
