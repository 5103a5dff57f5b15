//! The tagged union exchanged between connections and the rest of the engine.

use super::types::{
    ChannelCommand, ChannelInfo, ChannelList, ChannelListRequest, ChatMessage, Connected,
    MemberNotice,
};

/// Wire tags, one per envelope variant.
pub mod tags {
    /// Chat line.
    pub const CHAT: &str = "channel.chat";
    /// Join command.
    pub const JOIN: &str = "channel.join";
    /// Leave command.
    pub const LEAVE: &str = "channel.leave";
    /// Membership snapshot for a newly joined user.
    pub const INFO: &str = "channel.info";
    /// Channel list request.
    pub const LIST_REQUEST: &str = "channels.list";
    /// Channel list response.
    pub const LIST_RESPONSE: &str = "channels.list.reply";
    /// Direct notice: you joined a channel.
    pub const USER_JOIN: &str = "user.join";
    /// Direct notice: you left a channel.
    pub const USER_LEAVE: &str = "user.leave";
    /// Direct notice: your connection is live.
    pub const CONNECTED: &str = "user.connected";
    /// Hub broadcast: a member joined.
    pub const JOINED: &str = "channel.joined";
    /// Hub broadcast: a member left.
    pub const LEFT: &str = "channel.left";
}

/// A self-describing message.
///
/// Each variant maps to exactly one wire tag; see [`Envelope::tag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Chat line sent to a channel.
    Chat(ChatMessage),
    /// Client asks to join a channel.
    Join(ChannelCommand),
    /// Client asks to leave a channel.
    Leave(ChannelCommand),
    /// Current member list of a channel.
    Info(ChannelInfo),
    /// Client asks for the known channel names.
    ListRequest(ChannelListRequest),
    /// Known channel names.
    ListResponse(ChannelList),
    /// The receiving user joined a channel.
    UserJoin(MemberNotice),
    /// The receiving user left a channel.
    UserLeave(MemberNotice),
    /// The receiving connection is live.
    Connected(Connected),
    /// Someone joined a channel the receiver is in.
    Joined(MemberNotice),
    /// Someone left a channel the receiver is in.
    Left(MemberNotice),
}

impl Envelope {
    /// Returns the wire tag for this variant.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Chat(_) => tags::CHAT,
            Self::Join(_) => tags::JOIN,
            Self::Leave(_) => tags::LEAVE,
            Self::Info(_) => tags::INFO,
            Self::ListRequest(_) => tags::LIST_REQUEST,
            Self::ListResponse(_) => tags::LIST_RESPONSE,
            Self::UserJoin(_) => tags::USER_JOIN,
            Self::UserLeave(_) => tags::USER_LEAVE,
            Self::Connected(_) => tags::CONNECTED,
            Self::Joined(_) => tags::JOINED,
            Self::Left(_) => tags::LEFT,
        }
    }
}
