//! Connection management — per-connection agents, shared handles, pool, keepalive.

pub mod agent;
pub mod frame;
pub mod handle;
pub mod heartbeat;
pub mod manager;
pub mod pool;

pub use agent::{AgentConfig, ConnectionAgent};
pub use frame::Frame;
pub use handle::ConnectionHandle;
pub use manager::ConnectionManager;
