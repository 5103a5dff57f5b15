//! The view of a connection that a channel hub holds.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::connection::handle::ConnectionId;

/// A channel member: enough of a connection to deliver to it and to cut it
/// off, without access to its membership state.
#[derive(Debug, Clone)]
pub struct Member {
    /// Connection the member belongs to.
    pub id: ConnectionId,
    /// Display name.
    pub username: String,
    /// The connection's outbound queue.
    outbound: mpsc::Sender<String>,
    /// Cancelled to force the connection closed.
    closed: CancellationToken,
}

impl Member {
    /// Create a member view over a connection's queue and close signal.
    pub fn new(
        id: ConnectionId,
        username: impl Into<String>,
        outbound: mpsc::Sender<String>,
        closed: CancellationToken,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            outbound,
            closed,
        }
    }

    /// Attempts to enqueue a payload without waiting.
    pub fn try_deliver(&self, payload: String) -> Result<(), TrySendError<String>> {
        self.outbound.try_send(payload)
    }

    /// Forces the connection closed.
    pub fn disconnect(&self) {
        self.closed.cancel();
    }
}
