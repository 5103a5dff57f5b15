//! Real-time connection and channel configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of each connection's outbound queue.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Capacity of each channel hub's event queue.
    #[serde(default = "default_hub_buffer")]
    pub hub_buffer_size: usize,
    /// Maximum accepted inbound frame size in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Seconds without any inbound frame before a connection is considered dead.
    #[serde(default = "default_read_idle_timeout")]
    pub read_idle_timeout_seconds: u64,
    /// Seconds allowed for a single outbound frame write.
    #[serde(default = "default_write_timeout")]
    pub write_timeout_seconds: u64,
    /// Channels created when the registry is constructed.
    #[serde(default = "default_channels")]
    pub default_channels: Vec<String>,
}

impl RealtimeConfig {
    /// Read-idle timeout as a [`Duration`].
    pub fn read_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.read_idle_timeout_seconds)
    }

    /// Write timeout as a [`Duration`].
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_seconds)
    }

    /// Keepalive period: nine tenths of the read-idle timeout.
    pub fn keepalive_period(&self) -> Duration {
        self.read_idle_timeout() * 9 / 10
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            hub_buffer_size: default_hub_buffer(),
            max_frame_bytes: default_max_frame_bytes(),
            read_idle_timeout_seconds: default_read_idle_timeout(),
            write_timeout_seconds: default_write_timeout(),
            default_channels: default_channels(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_hub_buffer() -> usize {
    64
}

fn default_max_frame_bytes() -> usize {
    4096
}

fn default_read_idle_timeout() -> u64 {
    60
}

fn default_write_timeout() -> u64 {
    10
}

fn default_channels() -> Vec<String> {
    vec!["General".to_string(), "Random".to_string()]
}
