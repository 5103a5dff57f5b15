//! Channel registry — hands out the single hub for each channel name.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use chathub_core::config::RealtimeConfig;

use crate::metrics::EngineMetrics;

use super::hub::ChannelHub;

/// Registry of all channels known to the process.
///
/// Channels are never removed: an empty channel keeps its control loop and
/// can be joined again at any time.
#[derive(Debug)]
pub struct ChannelRegistry {
    /// Channel name → hub. Held only for lookup-or-create.
    channels: Mutex<HashMap<String, ChannelHub>>,
    /// Event queue capacity for new hubs.
    hub_buffer_size: usize,
    /// Metrics.
    metrics: Arc<EngineMetrics>,
}

impl ChannelRegistry {
    /// Creates an empty channel registry.
    pub fn new(hub_buffer_size: usize, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            hub_buffer_size,
            metrics,
        }
    }

    /// Creates a registry with the configured default channels already
    /// running. Must be called from within a tokio runtime.
    pub fn from_config(config: &RealtimeConfig, metrics: Arc<EngineMetrics>) -> Self {
        let registry = Self::new(config.hub_buffer_size, metrics);
        for name in &config.default_channels {
            registry.get_or_create(name);
        }
        registry
    }

    /// Returns the hub for `name`, starting it on first reference.
    pub fn get_or_create(&self, name: &str) -> ChannelHub {
        let mut channels = self.lock();
        if let Some(hub) = channels.get(name) {
            return hub.clone();
        }

        info!(channel = %name, "Creating channel");
        let hub = ChannelHub::spawn(name, self.hub_buffer_size, self.metrics.clone());
        channels.insert(name.to_string(), hub.clone());
        self.metrics.channel_created();
        hub
    }

    /// Returns the hub for `name` if it exists.
    pub fn get(&self, name: &str) -> Option<ChannelHub> {
        self.lock().get(name).cloned()
    }

    /// Snapshot of known channel names, in no particular order.
    pub fn list(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Returns total number of channels.
    pub fn channel_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ChannelHub>> {
        // the map is only touched by insert/lookup, so a poisoned guard is
        // still consistent
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
