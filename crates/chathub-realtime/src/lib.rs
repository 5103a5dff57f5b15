//! # chathub-realtime
//!
//! Real-time chat engine for ChatHub. Provides:
//!
//! - A self-describing envelope codec (`TAG\nJSON`) that fails closed on
//!   unknown tags
//! - Per-channel hubs whose single control loop serializes join, leave, and
//!   broadcast events and evicts slow consumers
//! - A process-wide channel registry handing out one hub per name
//! - Per-connection agents running inbound, outbound, and command duties
//! - Connection pooling and engine metrics

pub mod channel;
pub mod connection;
pub mod error;
pub mod message;
pub mod metrics;
pub mod server;

pub use channel::hub::ChannelHub;
pub use channel::registry::ChannelRegistry;
pub use connection::frame::Frame;
pub use connection::manager::ConnectionManager;
pub use error::RealtimeError;
pub use message::envelope::Envelope;
pub use server::RealtimeEngine;
