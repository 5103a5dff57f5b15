//! Transport-neutral frames exchanged with a connection.
//!
//! The transport layer (WebSocket in the server) converts its own message
//! type to and from [`Frame`]; agents never see the transport directly.

use bytes::Bytes;

/// One discrete transport frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 application data.
    Text(String),
    /// Binary application data.
    Binary(Bytes),
    /// Keepalive probe.
    Ping(Bytes),
    /// Keepalive reply.
    Pong(Bytes),
    /// Orderly close.
    Close,
}
