//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use tracing::info;

use chathub_core::config::RealtimeConfig;

use crate::channel::registry::ChannelRegistry;
use crate::connection::manager::ConnectionManager;
use crate::metrics::EngineMetrics;

/// Central real-time engine: the channel registry, the connection manager,
/// and their shared metrics.
#[derive(Debug, Clone)]
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Channel registry.
    pub channels: Arc<ChannelRegistry>,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    /// Configuration.
    pub config: RealtimeConfig,
}

impl RealtimeEngine {
    /// Creates the engine and starts the default channels. Must be called
    /// from within a tokio runtime.
    pub fn new(config: RealtimeConfig) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        let channels = Arc::new(ChannelRegistry::from_config(&config, metrics.clone()));
        let connections = Arc::new(ConnectionManager::new(
            &config,
            channels.clone(),
            metrics.clone(),
        ));

        info!(
            default_channels = ?config.default_channels,
            "Real-time engine initialized"
        );

        Self {
            connections,
            channels,
            metrics,
            config,
        }
    }

    /// Initiates a graceful shutdown: every connection is told to close.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let closed = self.connections.close_all();
        info!(connections = closed, "Real-time engine shut down");
    }
}
