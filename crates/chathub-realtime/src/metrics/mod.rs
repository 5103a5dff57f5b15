//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Total connections established
    pub connections_total: AtomicU64,
    /// Connections currently live
    pub connections_active: AtomicU64,
    /// Frames received from clients
    pub frames_received: AtomicU64,
    /// Frames dropped because they failed to decode
    pub decode_failures: AtomicU64,
    /// Payloads handed to member outbound queues
    pub messages_delivered: AtomicU64,
    /// Self-addressed notices dropped on a full queue
    pub messages_dropped: AtomicU64,
    /// Members evicted for a full outbound queue
    pub slow_consumer_evictions: AtomicU64,
    /// Channels created
    pub channels_created: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a torn-down connection
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record an inbound frame
    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an undecodable frame
    pub fn decode_failed(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` deliveries into outbound queues
    pub fn delivered(&self, count: u64) {
        self.messages_delivered.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a dropped self-addressed notice
    pub fn dropped(&self) {
        self.messages_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a slow-consumer eviction
    pub fn evicted(&self) {
        self.slow_consumer_evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a channel creation
    pub fn channel_created(&self) {
        self.channels_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            slow_consumer_evictions: self.slow_consumer_evictions.load(Ordering::Relaxed),
            channels_created: self.channels_created.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever established
    pub connections_total: u64,
    /// Currently live connections
    pub connections_active: u64,
    /// Frames received from clients
    pub frames_received: u64,
    /// Frames dropped as undecodable
    pub decode_failures: u64,
    /// Payloads handed to member outbound queues
    pub messages_delivered: u64,
    /// Self-addressed notices dropped on a full queue
    pub messages_dropped: u64,
    /// Members evicted for a full outbound queue
    pub slow_consumer_evictions: u64,
    /// Channels created
    pub channels_created: u64,
}
