//! Errors raised by connection agents and channel hubs.

use thiserror::Error;

use chathub_core::error::{AppError, ErrorKind};

/// Failures of realtime operations.
///
/// None of these are fatal to the process: protocol and command errors are
/// logged against the issuing connection, and transport faults only end that
/// one connection.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Join requested for a channel the connection is already in.
    #[error("already in channel {0:?}")]
    AlreadyMember(String),
    /// Leave or chat for a channel the connection has not joined.
    #[error("not in channel {0:?}")]
    NotMember(String),
    /// Channel name failed validation.
    #[error("invalid channel name {0:?}")]
    InvalidChannelName(String),
    /// Inbound frame exceeds the size limit.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge {
        /// Frame length.
        len: usize,
        /// Configured limit.
        max: usize,
    },
    /// The connection is shutting down and accepts no new memberships.
    #[error("connection is closing")]
    Closing,
    /// The hub's control loop is gone.
    #[error("channel {0:?} is no longer running")]
    HubClosed(String),
    /// A server-to-client message arrived from a client.
    #[error("unexpected {0} message from client")]
    UnexpectedMessage(&'static str),
    /// An envelope could not be encoded.
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<RealtimeError> for AppError {
    fn from(err: RealtimeError) -> Self {
        let kind = match &err {
            RealtimeError::AlreadyMember(_) => ErrorKind::Conflict,
            RealtimeError::NotMember(_) => ErrorKind::NotFound,
            RealtimeError::InvalidChannelName(_)
            | RealtimeError::FrameTooLarge { .. }
            | RealtimeError::UnexpectedMessage(_) => ErrorKind::Validation,
            RealtimeError::Closing | RealtimeError::HubClosed(_) => ErrorKind::ServiceUnavailable,
            RealtimeError::Encode(_) => ErrorKind::Serialization,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
