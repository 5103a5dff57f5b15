//! Keepalive and idle-timeout settings for a connection.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use chathub_core::config::RealtimeConfig;

/// Heartbeat configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Silence from the peer tolerated before the connection is dead
    pub read_idle_timeout: Duration,
    /// Interval between pings while no data is written
    pub keepalive_period: Duration,
    /// Time allowed for a single frame write
    pub write_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            read_idle_timeout: config.read_idle_timeout(),
            keepalive_period: config.keepalive_period(),
            write_timeout: config.write_timeout(),
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::from(&RealtimeConfig::default())
    }
}

/// Ticker for keepalive pings. The first tick fires one full period from
/// now; call `reset()` after each data write to keep pings to idle periods.
pub fn keepalive_ticker(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
