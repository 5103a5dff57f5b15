//! Payload schemas carried inside envelopes.
//!
//! Unknown fields are ignored on decode so peers can add fields without
//! breaking older readers. Fields the server stamps itself (`sender`,
//! `username` on commands) default to empty when a client omits them.

use serde::{Deserialize, Serialize};

/// A chat line addressed to one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display name of the author, stamped by the server.
    #[serde(default)]
    pub sender: String,
    /// Target channel.
    pub channel: String,
    /// Free-text body.
    pub message: String,
}

/// Join or leave command issued by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCommand {
    /// Channel to join or leave.
    pub channel: String,
    /// Issuing user, stamped by the server.
    #[serde(default)]
    pub username: String,
}

/// Membership snapshot sent to a user right after joining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel name.
    #[serde(alias = "name")]
    pub channel: String,
    /// User the snapshot is addressed to.
    pub username: String,
    /// Current members, in no particular order.
    pub users: Vec<String>,
}

/// Request for the names of all known channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelListRequest {}

/// Names of all known channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelList {
    /// Channel names, in no particular order.
    pub channels: Vec<String>,
}

/// A `{username, channel}` pair. Used for the direct `user.join` /
/// `user.leave` notices and for the hub's `channel.joined` /
/// `channel.left` broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberNotice {
    /// User the notice is about.
    pub username: String,
    /// Channel the notice is about.
    pub channel: String,
}

/// Greeting sent once a connection is live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connected {
    /// Authenticated display name of the connection.
    pub username: String,
}
