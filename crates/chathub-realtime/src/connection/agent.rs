//! Per-connection agent.
//!
//! Each connection runs three duties:
//!
//! - **inbound** reads frames from the transport and queues them for the
//!   command duty, enforcing the read idle timeout and frame size limit;
//! - **outbound** drains the bounded outbound queue to the transport and
//!   sends keepalive pings while idle;
//! - **command** decodes queued frames and applies them.
//!
//! A supervisor waits for all three and finishes channel cleanup. Any duty
//! stopping cancels the shared close signal, which stops the others.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, trace, warn};

use chathub_core::config::RealtimeConfig;

use crate::channel::registry::ChannelRegistry;
use crate::message::builder;
use crate::message::codec;
use crate::message::validator;
use crate::metrics::EngineMetrics;

use super::frame::Frame;
use super::handle::ConnectionHandle;
use super::heartbeat::{self, HeartbeatConfig};

/// Per-connection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentConfig {
    /// Largest accepted inbound frame, in bytes
    pub max_frame_bytes: usize,
    /// Outbound queue capacity
    pub outbound_buffer_size: usize,
    /// Keepalive and timeouts
    pub heartbeat: HeartbeatConfig,
}

impl From<&RealtimeConfig> for AgentConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            max_frame_bytes: config.max_frame_bytes,
            outbound_buffer_size: config.outbound_buffer_size,
            heartbeat: HeartbeatConfig::from(config),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from(&RealtimeConfig::default())
    }
}

#[derive(Debug, Error)]
enum WriteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("write timed out after {0:?}")]
    TimedOut(Duration),
}

/// An accepted connection that has not started yet.
pub struct ConnectionAgent<S, K> {
    handle: Arc<ConnectionHandle>,
    outbound: mpsc::Receiver<String>,
    stream: S,
    sink: K,
    config: AgentConfig,
}

impl<S, K, E> ConnectionAgent<S, K>
where
    S: Stream<Item = Result<Frame, E>> + Unpin + Send + 'static,
    E: Display + Send + 'static,
    K: Sink<Frame> + Unpin + Send + 'static,
    K::Error: Display + Send,
{
    /// Wrap a transport for `username`.
    pub fn new(
        username: impl Into<String>,
        registry: Arc<ChannelRegistry>,
        metrics: Arc<EngineMetrics>,
        config: AgentConfig,
        sink: K,
        stream: S,
    ) -> Self {
        let (handle, outbound) =
            ConnectionHandle::new(username, registry, metrics, config.outbound_buffer_size);
        Self {
            handle,
            outbound,
            stream,
            sink,
            config,
        }
    }

    /// Shared handle of this connection.
    pub fn handle(&self) -> &Arc<ConnectionHandle> {
        &self.handle
    }

    /// Spawn the connection on the runtime.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run the connection until every duty has stopped and the connection
    /// has left all of its channels.
    pub async fn run(self) {
        let Self {
            handle,
            outbound,
            stream,
            sink,
            config,
        } = self;

        info!(conn_id = %handle.id, username = %handle.username, "Connection started");
        handle.send_self_describing(&builder::build_connected(&handle.username));

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let inbound = tokio::spawn(run_inbound(handle.clone(), stream, inbound_tx, config));
        let outbound = tokio::spawn(run_outbound(handle.clone(), sink, outbound, config.heartbeat));
        let commands = tokio::spawn(run_commands(handle.clone(), inbound_rx));

        let (inbound, outbound, commands) = tokio::join!(inbound, outbound, commands);
        for (duty, result) in [("inbound", inbound), ("outbound", outbound), ("command", commands)] {
            if let Err(e) = result {
                error!(conn_id = %handle.id, duty, error = %e, "Connection duty failed");
            }
        }

        // a failed inbound duty never ran its own cleanup
        handle.close();
        handle.leave_all_channels().await;
        info!(conn_id = %handle.id, username = %handle.username, "Connection closed");
    }
}

async fn run_inbound<S, E>(
    handle: Arc<ConnectionHandle>,
    mut stream: S,
    inbound: mpsc::UnboundedSender<Vec<u8>>,
    config: AgentConfig,
) where
    S: Stream<Item = Result<Frame, E>> + Unpin,
    E: Display,
{
    let idle = config.heartbeat.read_idle_timeout;

    loop {
        let next = tokio::select! {
            _ = handle.closed() => {
                debug!(conn_id = %handle.id, "Connection closing, stopping reads");
                break;
            }
            next = time::timeout(idle, stream.next()) => next,
        };

        let frame = match next {
            Err(_) => {
                warn!(conn_id = %handle.id, username = %handle.username, idle = ?idle, "Read idle timeout");
                break;
            }
            Ok(None) => {
                debug!(conn_id = %handle.id, "Peer disconnected");
                break;
            }
            Ok(Some(Err(e))) => {
                warn!(conn_id = %handle.id, error = %e, "Read error");
                break;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        let raw = match frame {
            Frame::Text(text) => text.into_bytes(),
            Frame::Binary(bytes) => bytes.to_vec(),
            Frame::Ping(_) | Frame::Pong(_) => {
                trace!(conn_id = %handle.id, "Keepalive frame received");
                continue;
            }
            Frame::Close => {
                debug!(conn_id = %handle.id, "Peer sent close");
                break;
            }
        };

        if let Err(e) = validator::validate_frame_size(raw.len(), config.max_frame_bytes) {
            warn!(conn_id = %handle.id, username = %handle.username, error = %e, "Rejecting frame");
            break;
        }

        let trimmed = raw.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        handle.metrics().frame_received();
        if inbound.send(trimmed.to_vec()).is_err() {
            break;
        }
    }

    handle.close();
    drop(inbound);
    handle.leave_all_channels().await;
}

async fn run_outbound<K>(
    handle: Arc<ConnectionHandle>,
    mut sink: K,
    mut outbound: mpsc::Receiver<String>,
    heartbeat: HeartbeatConfig,
) where
    K: Sink<Frame> + Unpin,
    K::Error: Display,
{
    let mut keepalive = heartbeat::keepalive_ticker(heartbeat.keepalive_period);

    loop {
        tokio::select! {
            biased;

            _ = handle.closed() => {
                debug!(conn_id = %handle.id, "Connection closing, sending close frame");
                let _ = write_frame(&mut sink, Frame::Close, heartbeat.write_timeout).await;
                break;
            }
            payload = outbound.recv() => {
                let Some(payload) = payload else {
                    let _ = write_frame(&mut sink, Frame::Close, heartbeat.write_timeout).await;
                    break;
                };
                if let Err(e) = write_frame(&mut sink, Frame::Text(payload), heartbeat.write_timeout).await {
                    warn!(conn_id = %handle.id, username = %handle.username, error = %e, "Write failed");
                    break;
                }
                keepalive.reset();
            }
            _ = keepalive.tick() => {
                if let Err(e) = write_frame(&mut sink, Frame::Ping(Bytes::new()), heartbeat.write_timeout).await {
                    warn!(conn_id = %handle.id, error = %e, "Keepalive failed");
                    break;
                }
                trace!(conn_id = %handle.id, "Keepalive sent");
            }
        }
    }

    handle.close();
    let _ = time::timeout(heartbeat.write_timeout, sink.close()).await;
}

async fn write_frame<K>(sink: &mut K, frame: Frame, limit: Duration) -> Result<(), WriteError>
where
    K: Sink<Frame> + Unpin,
    K::Error: Display,
{
    match time::timeout(limit, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(WriteError::Transport(e.to_string())),
        Err(_) => Err(WriteError::TimedOut(limit)),
    }
}

async fn run_commands(handle: Arc<ConnectionHandle>, mut inbound: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(raw) = inbound.recv().await {
        if handle.is_closed() {
            break;
        }

        let envelope = match codec::decode(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                handle.metrics().decode_failed();
                warn!(conn_id = %handle.id, username = %handle.username, error = %e, "Dropping undecodable frame");
                continue;
            }
        };

        let tag = envelope.tag();
        if let Err(e) = handle.dispatch(envelope).await {
            warn!(conn_id = %handle.id, username = %handle.username, tag, error = %e, "Command failed");
        }
    }
}
