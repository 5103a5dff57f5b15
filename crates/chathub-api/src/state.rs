//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use chathub_auth::WsAuthenticator;
use chathub_core::config::AppConfig;
use chathub_realtime::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// WebSocket token authenticator
    pub authenticator: Arc<WsAuthenticator>,
    /// Channel and connection engine
    pub realtime: Arc<RealtimeEngine>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Builds the state from configuration, starting the realtime engine.
    /// Must be called from within a tokio runtime.
    pub fn new(config: AppConfig) -> Self {
        let authenticator = Arc::new(WsAuthenticator::new(&config.auth));
        let realtime = Arc::new(RealtimeEngine::new(config.realtime.clone()));
        Self {
            config: Arc::new(config),
            authenticator,
            realtime,
            started_at: Instant::now(),
        }
    }
}
