//! Shared state of one live connection: its outbound queue, its close
//! signal, and the set of channels it belongs to.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::channel::hub::ChannelHub;
use crate::channel::member::Member;
use crate::channel::registry::ChannelRegistry;
use crate::error::RealtimeError;
use crate::message::builder;
use crate::message::codec;
use crate::message::envelope::Envelope;
use crate::message::types::ChatMessage;
use crate::message::validator;
use crate::metrics::EngineMetrics;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// Channels a connection belongs to.
#[derive(Debug, Default)]
struct Memberships {
    /// Channel name → hub.
    channels: HashMap<String, ChannelHub>,
    /// Set once disconnect cleanup has started; no joins are accepted after.
    closing: bool,
}

/// A handle to a single connection.
///
/// Shared by the connection's duties and by the connection pool. Membership
/// changes go through one async mutex so that an explicit leave and
/// disconnect cleanup never remove the same membership twice.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Authenticated username
    pub username: String,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Sender side of the bounded outbound queue
    outbound: mpsc::Sender<String>,
    /// Cancelled once the connection starts shutting down
    closed: CancellationToken,
    /// Channel memberships
    memberships: Mutex<Memberships>,
    /// Channel lookup
    registry: Arc<ChannelRegistry>,
    /// Metrics
    metrics: Arc<EngineMetrics>,
}

impl ConnectionHandle {
    /// Create a handle and the receiving end of its outbound queue.
    pub fn new(
        username: impl Into<String>,
        registry: Arc<ChannelRegistry>,
        metrics: Arc<EngineMetrics>,
        outbound_capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<String>) {
        let (outbound, rx) = mpsc::channel(outbound_capacity.max(1));
        let handle = Self {
            id: Uuid::new_v4(),
            username: username.into(),
            connected_at: Utc::now(),
            outbound,
            closed: CancellationToken::new(),
            memberships: Mutex::new(Memberships::default()),
            registry,
            metrics,
        };
        (Arc::new(handle), rx)
    }

    /// The view of this connection handed to channel hubs.
    pub fn member(&self) -> Member {
        Member::new(
            self.id,
            self.username.clone(),
            self.outbound.clone(),
            self.closed.clone(),
        )
    }

    pub(crate) fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Encode an envelope and enqueue it for this connection only.
    ///
    /// Never waits: on a full queue the envelope is dropped and `false` is
    /// returned.
    pub fn send_self_describing(&self, envelope: &Envelope) -> bool {
        let payload = match codec::encode(envelope) {
            Ok(payload) => payload,
            Err(e) => {
                error!(conn_id = %self.id, tag = envelope.tag(), error = %e, "Failed to encode envelope");
                return false;
            }
        };

        match self.outbound.try_send(payload) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(
                    conn_id = %self.id,
                    username = %self.username,
                    tag = envelope.tag(),
                    "Outbound queue full, dropping message"
                );
                self.metrics.dropped();
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(conn_id = %self.id, tag = envelope.tag(), "Outbound queue closed");
                false
            }
        }
    }

    /// Signal every duty of this connection to stop.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Whether the connection is shutting down.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once the connection starts shutting down.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.closed.cancelled()
    }

    /// Join `name`, creating the channel if needed.
    ///
    /// On success the connection receives a `user.join` confirmation and a
    /// `channel.info` snapshot of the members.
    pub async fn join_channel(&self, name: &str) -> Result<(), RealtimeError> {
        validator::validate_channel_name(name)?;

        let mut memberships = self.memberships.lock().await;
        if memberships.closing {
            return Err(RealtimeError::Closing);
        }
        if memberships.channels.contains_key(name) {
            return Err(RealtimeError::AlreadyMember(name.to_string()));
        }

        let hub = self.registry.get_or_create(name);
        let users = hub.join(self.member()).await?;
        memberships.channels.insert(name.to_string(), hub);
        drop(memberships);

        info!(conn_id = %self.id, username = %self.username, channel = %name, "Joined channel");
        self.send_self_describing(&builder::build_user_join(name, &self.username));
        self.send_self_describing(&builder::build_channel_info(name, &self.username, users));
        Ok(())
    }

    /// Leave `name` and confirm with a `user.leave` notice.
    pub async fn leave_channel(&self, name: &str) -> Result<(), RealtimeError> {
        let mut memberships = self.memberships.lock().await;
        let hub = memberships
            .channels
            .remove(name)
            .ok_or_else(|| RealtimeError::NotMember(name.to_string()))?;
        let removed = hub.leave(self.id).await;
        drop(memberships);

        if !removed? {
            debug!(conn_id = %self.id, channel = %name, "Channel had already dropped this connection");
        }

        info!(conn_id = %self.id, username = %self.username, channel = %name, "Left channel");
        self.send_self_describing(&builder::build_user_leave(name, &self.username));
        Ok(())
    }

    /// Relay a chat message to a channel this connection belongs to.
    ///
    /// The sender is always stamped with the authenticated username.
    pub async fn broadcast_to_channel(&self, mut chat: ChatMessage) -> Result<(), RealtimeError> {
        let hub = self
            .memberships
            .lock()
            .await
            .channels
            .get(&chat.channel)
            .cloned()
            .ok_or_else(|| RealtimeError::NotMember(chat.channel.clone()))?;

        chat.sender = self.username.clone();
        let payload = codec::encode(&Envelope::Chat(chat))?;
        hub.broadcast(payload).await
    }

    /// Reply with the names of every known channel.
    pub fn send_channel_list(&self) {
        let channels = self.registry.list();
        self.send_self_describing(&builder::build_channel_list(channels));
    }

    /// Leave every joined channel and refuse further joins.
    ///
    /// Idempotent: later calls find nothing to leave.
    pub async fn leave_all_channels(&self) {
        let drained: Vec<(String, ChannelHub)> = {
            let mut memberships = self.memberships.lock().await;
            memberships.closing = true;
            memberships.channels.drain().collect()
        };

        for (name, hub) in drained {
            match hub.leave(self.id).await {
                Ok(true) => {
                    self.send_self_describing(&builder::build_user_leave(&name, &self.username));
                }
                Ok(false) => {
                    debug!(conn_id = %self.id, channel = %name, "Channel had already dropped this connection");
                }
                Err(e) => {
                    warn!(conn_id = %self.id, channel = %name, error = %e, "Failed to leave channel during cleanup");
                }
            }
        }
    }

    /// Names of the channels currently joined.
    pub async fn joined_channels(&self) -> Vec<String> {
        self.memberships
            .lock()
            .await
            .channels
            .keys()
            .cloned()
            .collect()
    }

    /// Apply one decoded client command.
    pub async fn dispatch(&self, envelope: Envelope) -> Result<(), RealtimeError> {
        match envelope {
            Envelope::Chat(chat) => self.broadcast_to_channel(chat).await,
            Envelope::Join(command) => self.join_channel(&command.channel).await,
            Envelope::Leave(command) => self.leave_channel(&command.channel).await,
            Envelope::ListRequest(_) => {
                self.send_channel_list();
                Ok(())
            }
            other => Err(RealtimeError::UnexpectedMessage(other.tag())),
        }
    }

    /// Get a snapshot of connection info
    pub async fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            username: self.username.clone(),
            connected_at: self.connected_at,
            channels: self.joined_channels().await,
            closed: self.is_closed(),
        }
    }
}

/// Snapshot of connection info (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// Username
    pub username: String,
    /// Connected at
    pub connected_at: DateTime<Utc>,
    /// Joined channels
    pub channels: Vec<String>,
    /// Whether shutdown has started
    pub closed: bool,
}
