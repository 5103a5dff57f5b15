//! Message validation rules.

use crate::error::RealtimeError;

/// Maximum channel name length in bytes.
pub const MAX_CHANNEL_NAME_LEN: usize = 64;

/// Validates an inbound frame's size.
pub fn validate_frame_size(len: usize, max: usize) -> Result<(), RealtimeError> {
    if len > max {
        return Err(RealtimeError::FrameTooLarge { len, max });
    }
    Ok(())
}

/// Validates channel name format.
pub fn validate_channel_name(channel: &str) -> Result<(), RealtimeError> {
    if channel.trim().is_empty() || channel.len() > MAX_CHANNEL_NAME_LEN {
        return Err(RealtimeError::InvalidChannelName(channel.to_string()));
    }

    if channel.chars().any(char::is_control) {
        return Err(RealtimeError::InvalidChannelName(channel.to_string()));
    }

    Ok(())
}
