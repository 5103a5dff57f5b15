//! Per-channel hub: one control loop owns the member set and serializes
//! every join, leave, and broadcast for the channel.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::connection::handle::ConnectionId;
use crate::error::RealtimeError;
use crate::message::builder;
use crate::message::codec;
use crate::metrics::EngineMetrics;

use super::member::Member;

/// Requests processed by a hub's control loop, strictly in arrival order.
#[derive(Debug)]
enum HubCommand {
    Join {
        member: Member,
        ack: oneshot::Sender<Vec<String>>,
    },
    Leave {
        id: ConnectionId,
        ack: oneshot::Sender<bool>,
    },
    Broadcast {
        payload: String,
    },
    Members {
        reply: oneshot::Sender<Vec<String>>,
    },
}

/// Handle to a running channel hub. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChannelHub {
    name: Arc<str>,
    commands: mpsc::Sender<HubCommand>,
}

impl ChannelHub {
    /// Starts the control loop for `name` and returns a handle to it.
    ///
    /// Must be called from within a tokio runtime. The loop runs until every
    /// handle has been dropped.
    pub fn spawn(name: impl Into<String>, buffer: usize, metrics: Arc<EngineMetrics>) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        let (commands, rx) = mpsc::channel(buffer.max(1));

        let control = ControlLoop {
            name: name.clone(),
            members: HashMap::new(),
            commands: rx,
            metrics,
        };
        tokio::spawn(control.run());

        Self { name, commands }
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether two handles address the same control loop.
    pub fn same_hub(&self, other: &ChannelHub) -> bool {
        self.commands.same_channel(&other.commands)
    }

    /// Adds a member and announces it to everyone, the joiner included.
    ///
    /// Resolves once the join has been applied, with the member list as of
    /// that moment.
    pub async fn join(&self, member: Member) -> Result<Vec<String>, RealtimeError> {
        let (ack, rx) = oneshot::channel();
        self.submit(HubCommand::Join { member, ack }).await?;
        rx.await.map_err(|_| self.closed())
    }

    /// Removes a member and announces the departure to those remaining.
    ///
    /// Resolves to `false` when the connection was not a member, which is
    /// logged by the hub but is not an error: disconnect cleanup can race an
    /// explicit leave or a slow-consumer eviction.
    pub async fn leave(&self, id: ConnectionId) -> Result<bool, RealtimeError> {
        let (ack, rx) = oneshot::channel();
        self.submit(HubCommand::Leave { id, ack }).await?;
        rx.await.map_err(|_| self.closed())
    }

    /// Queues an encoded payload for delivery, verbatim, to every member.
    pub async fn broadcast(&self, payload: String) -> Result<(), RealtimeError> {
        self.submit(HubCommand::Broadcast { payload }).await
    }

    /// Current member usernames, in no particular order.
    pub async fn members(&self) -> Result<Vec<String>, RealtimeError> {
        let (reply, rx) = oneshot::channel();
        self.submit(HubCommand::Members { reply }).await?;
        rx.await.map_err(|_| self.closed())
    }

    async fn submit(&self, command: HubCommand) -> Result<(), RealtimeError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| self.closed())
    }

    fn closed(&self) -> RealtimeError {
        RealtimeError::HubClosed(self.name.to_string())
    }
}

/// State owned exclusively by the hub task.
struct ControlLoop {
    name: Arc<str>,
    members: HashMap<ConnectionId, Member>,
    commands: mpsc::Receiver<HubCommand>,
    metrics: Arc<EngineMetrics>,
}

impl ControlLoop {
    async fn run(mut self) {
        debug!(channel = %self.name, "Channel control loop started");

        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Join { member, ack } => {
                    info!(channel = %self.name, username = %member.username, "User joined channel");
                    let notice = builder::build_channel_joined(&self.name, &member.username);
                    self.members.insert(member.id, member);
                    self.fan_out_envelope(&notice);
                    let _ = ack.send(self.usernames());
                }
                HubCommand::Leave { id, ack } => match self.members.remove(&id) {
                    Some(member) => {
                        info!(channel = %self.name, username = %member.username, "User left channel");
                        let notice = builder::build_channel_left(&self.name, &member.username);
                        self.fan_out_envelope(&notice);
                        let _ = ack.send(true);
                    }
                    None => {
                        warn!(channel = %self.name, conn_id = %id, "Leave from a connection that is not a member");
                        let _ = ack.send(false);
                    }
                },
                HubCommand::Broadcast { payload } => self.fan_out(payload),
                HubCommand::Members { reply } => {
                    let _ = reply.send(self.usernames());
                }
            }
        }

        debug!(channel = %self.name, "Channel control loop stopped");
    }

    fn usernames(&self) -> Vec<String> {
        self.members.values().map(|m| m.username.clone()).collect()
    }

    fn fan_out_envelope(&mut self, envelope: &crate::message::Envelope) {
        match codec::encode(envelope) {
            Ok(payload) => self.fan_out(payload),
            Err(e) => error!(channel = %self.name, error = %e, "Failed to encode channel notice"),
        }
    }

    /// Delivers `payload` to every member without ever waiting.
    ///
    /// A member whose queue is full or gone is removed and disconnected, and
    /// the remaining members are told it left. Those notices go through the
    /// same path, so an eviction can cascade; each round only shrinks the
    /// member set, so this terminates.
    fn fan_out(&mut self, payload: String) {
        let mut pending = VecDeque::from([payload]);

        while let Some(payload) = pending.pop_front() {
            let mut evicted = Vec::new();
            let mut delivered = 0u64;

            for (id, member) in &self.members {
                match member.try_deliver(payload.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        warn!(
                            channel = %self.name,
                            username = %member.username,
                            "Outbound queue full, disconnecting slow consumer"
                        );
                        self.metrics.evicted();
                        evicted.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(
                            channel = %self.name,
                            username = %member.username,
                            "Outbound queue closed, dropping member"
                        );
                        evicted.push(*id);
                    }
                }
            }
            self.metrics.delivered(delivered);

            for id in evicted {
                let Some(member) = self.members.remove(&id) else {
                    continue;
                };
                member.disconnect();
                let notice = builder::build_channel_left(&self.name, &member.username);
                match codec::encode(&notice) {
                    Ok(encoded) => pending.push_back(encoded),
                    Err(e) => {
                        error!(channel = %self.name, error = %e, "Failed to encode channel notice")
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    use super::*;
    use crate::message::Envelope;
    use crate::message::types::MemberNotice;

    struct TestMember {
        member: Member,
        rx: mpsc::Receiver<String>,
        closed: CancellationToken,
    }

    fn member(name: &str, capacity: usize) -> TestMember {
        let (tx, rx) = mpsc::channel(capacity);
        let closed = CancellationToken::new();
        TestMember {
            member: Member::new(Uuid::new_v4(), name, tx, closed.clone()),
            rx,
            closed,
        }
    }

    fn hub(name: &str) -> (ChannelHub, Arc<EngineMetrics>) {
        let metrics = Arc::new(EngineMetrics::new());
        (ChannelHub::spawn(name, 16, metrics.clone()), metrics)
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<Envelope> {
        let mut out = Vec::new();
        while let Ok(raw) = rx.try_recv() {
            out.push(codec::decode(raw.as_bytes()).expect("hub output decodes"));
        }
        out
    }

    fn joined(channel: &str, username: &str) -> Envelope {
        Envelope::Joined(MemberNotice {
            username: username.to_string(),
            channel: channel.to_string(),
        })
    }

    fn left(channel: &str, username: &str) -> Envelope {
        Envelope::Left(MemberNotice {
            username: username.to_string(),
            channel: channel.to_string(),
        })
    }

    fn chat(text: &str) -> (String, Envelope) {
        let envelope = Envelope::Chat(crate::message::types::ChatMessage {
            sender: "alice".to_string(),
            channel: "general".to_string(),
            message: text.to_string(),
        });
        (codec::encode(&envelope).expect("encode"), envelope)
    }

    #[tokio::test]
    async fn test_members_observe_events_in_submission_order() {
        let (hub, _) = hub("general");
        let mut alice = member("alice", 32);
        let mut bob = member("bob", 32);
        let (first, first_env) = chat("one");
        let (second, second_env) = chat("two");

        let users = hub.join(alice.member.clone()).await.expect("join alice");
        assert_eq!(users, vec!["alice"]);
        hub.broadcast(first).await.expect("broadcast");
        hub.join(bob.member.clone()).await.expect("join bob");
        hub.broadcast(second).await.expect("broadcast");
        assert!(hub.leave(alice.member.id).await.expect("leave alice"));
        hub.members().await.expect("barrier");

        assert_eq!(
            drain(&mut alice.rx),
            vec![
                joined("general", "alice"),
                first_env,
                joined("general", "bob"),
                second_env.clone(),
            ]
        );
        assert_eq!(
            drain(&mut bob.rx),
            vec![joined("general", "bob"), second_env, left("general", "alice")]
        );
    }

    #[tokio::test]
    async fn test_slow_consumer_is_evicted_without_blocking_others() {
        let (hub, metrics) = hub("general");
        let mut fast = member("fast", 32);
        let mut slow = member("slow", 1);

        hub.join(fast.member.clone()).await.expect("join fast");
        // the slow member's own join notice fills its single slot
        hub.join(slow.member.clone()).await.expect("join slow");

        let (payload, envelope) = chat("hello");
        hub.broadcast(payload).await.expect("broadcast");
        let members = hub.members().await.expect("members");

        assert_eq!(members, vec!["fast"]);
        assert!(slow.closed.is_cancelled());
        assert!(!fast.closed.is_cancelled());
        assert_eq!(
            drain(&mut fast.rx),
            vec![
                joined("general", "fast"),
                joined("general", "slow"),
                envelope,
                left("general", "slow"),
            ]
        );
        assert_eq!(drain(&mut slow.rx), vec![joined("general", "slow")]);
        assert_eq!(metrics.snapshot().slow_consumer_evictions, 1);
    }

    #[tokio::test]
    async fn test_leave_of_non_member_is_ignored() {
        let (hub, _) = hub("general");
        let mut alice = member("alice", 8);
        hub.join(alice.member.clone()).await.expect("join");
        drain(&mut alice.rx);

        assert!(!hub.leave(Uuid::new_v4()).await.expect("leave stranger"));
        assert!(hub.leave(alice.member.id).await.expect("leave alice"));
        assert!(!hub.leave(alice.member.id).await.expect("leave twice"));

        assert!(hub.members().await.expect("members").is_empty());
        assert!(drain(&mut alice.rx).is_empty());
    }

    #[tokio::test]
    async fn test_closed_queue_member_is_dropped() {
        let (hub, metrics) = hub("general");
        let mut alice = member("alice", 8);
        let gone = member("gone", 8);
        hub.join(alice.member.clone()).await.expect("join");
        hub.join(gone.member.clone()).await.expect("join");
        drop(gone.rx);

        let (payload, envelope) = chat("anyone?");
        hub.broadcast(payload).await.expect("broadcast");

        assert_eq!(hub.members().await.expect("members"), vec!["alice"]);
        let received = drain(&mut alice.rx);
        assert_eq!(received[received.len() - 2..], [envelope, left("general", "gone")]);
        assert_eq!(metrics.snapshot().slow_consumer_evictions, 0);
    }

    #[tokio::test]
    async fn test_empty_channel_stays_usable() {
        let (hub, _) = hub("quiet");
        let alice = member("alice", 8);
        hub.join(alice.member.clone()).await.expect("join");
        hub.leave(alice.member.id).await.expect("leave");

        tokio::time::sleep(Duration::from_millis(10)).await;
        let bob = member("bob", 8);
        assert_eq!(hub.join(bob.member.clone()).await.expect("rejoin"), vec!["bob"]);
    }
}
