//! Builder helpers for server-originated envelopes.

use super::envelope::Envelope;
use super::types::{ChannelInfo, ChannelList, Connected, MemberNotice};

fn notice(username: &str, channel: &str) -> MemberNotice {
    MemberNotice {
        username: username.to_string(),
        channel: channel.to_string(),
    }
}

/// Build the hub broadcast announcing a new member.
pub fn build_channel_joined(channel: &str, username: &str) -> Envelope {
    Envelope::Joined(notice(username, channel))
}

/// Build the hub broadcast announcing a departed member.
pub fn build_channel_left(channel: &str, username: &str) -> Envelope {
    Envelope::Left(notice(username, channel))
}

/// Build the direct notice confirming a join.
pub fn build_user_join(channel: &str, username: &str) -> Envelope {
    Envelope::UserJoin(notice(username, channel))
}

/// Build the direct notice confirming a leave.
pub fn build_user_leave(channel: &str, username: &str) -> Envelope {
    Envelope::UserLeave(notice(username, channel))
}

/// Build the member snapshot sent after a join.
pub fn build_channel_info(channel: &str, username: &str, users: Vec<String>) -> Envelope {
    Envelope::Info(ChannelInfo {
        channel: channel.to_string(),
        username: username.to_string(),
        users,
    })
}

/// Build the channel list response.
pub fn build_channel_list(channels: Vec<String>) -> Envelope {
    Envelope::ListResponse(ChannelList { channels })
}

/// Build the greeting sent when a connection goes live.
pub fn build_connected(username: &str) -> Envelope {
    Envelope::Connected(Connected {
        username: username.to_string(),
    })
}
