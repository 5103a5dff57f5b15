//! Envelope encoding: the tag, a newline, then the JSON payload.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::envelope::{Envelope, tags};

/// Separates the tag from the payload.
pub const DELIMITER: u8 = b'\n';

/// Reasons a frame could not be turned into an [`Envelope`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No newline between tag and payload.
    #[error("frame has no tag delimiter")]
    MissingDelimiter,
    /// The tag is not valid UTF-8.
    #[error("frame tag is not valid UTF-8")]
    InvalidTag,
    /// The tag names no known variant.
    #[error("unknown message tag {0:?}")]
    UnknownTag(String),
    /// The payload does not match the schema selected by the tag.
    #[error("malformed {tag} payload: {source}")]
    Payload {
        /// Tag whose schema was applied.
        tag: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Encodes an envelope as `TAG\nJSON`.
pub fn encode(envelope: &Envelope) -> Result<String, serde_json::Error> {
    let payload = match envelope {
        Envelope::Chat(m) => to_json(m),
        Envelope::Join(m) | Envelope::Leave(m) => to_json(m),
        Envelope::Info(m) => to_json(m),
        Envelope::ListRequest(m) => to_json(m),
        Envelope::ListResponse(m) => to_json(m),
        Envelope::UserJoin(m) | Envelope::UserLeave(m) => to_json(m),
        Envelope::Joined(m) | Envelope::Left(m) => to_json(m),
        Envelope::Connected(m) => to_json(m),
    }?;

    let tag = envelope.tag();
    let mut out = String::with_capacity(tag.len() + 1 + payload.len());
    out.push_str(tag);
    out.push(DELIMITER as char);
    out.push_str(&payload);
    Ok(out)
}

/// Decodes a `TAG\nJSON` frame.
///
/// The tag selects the payload schema. Unknown tags, missing delimiters, and
/// payloads that do not fit the schema are errors, never panics.
pub fn decode(bytes: &[u8]) -> Result<Envelope, DecodeError> {
    let split = bytes
        .iter()
        .position(|b| *b == DELIMITER)
        .ok_or(DecodeError::MissingDelimiter)?;
    let tag = std::str::from_utf8(&bytes[..split])
        .map_err(|_| DecodeError::InvalidTag)?
        .trim();
    let rest = &bytes[split + 1..];

    match tag {
        tags::CHAT => parse(tags::CHAT, rest).map(Envelope::Chat),
        tags::JOIN => parse(tags::JOIN, rest).map(Envelope::Join),
        tags::LEAVE => parse(tags::LEAVE, rest).map(Envelope::Leave),
        tags::INFO => parse(tags::INFO, rest).map(Envelope::Info),
        tags::LIST_REQUEST => parse(tags::LIST_REQUEST, rest).map(Envelope::ListRequest),
        tags::LIST_RESPONSE => parse(tags::LIST_RESPONSE, rest).map(Envelope::ListResponse),
        tags::USER_JOIN => parse(tags::USER_JOIN, rest).map(Envelope::UserJoin),
        tags::USER_LEAVE => parse(tags::USER_LEAVE, rest).map(Envelope::UserLeave),
        tags::CONNECTED => parse(tags::CONNECTED, rest).map(Envelope::Connected),
        tags::JOINED => parse(tags::JOINED, rest).map(Envelope::Joined),
        tags::LEFT => parse(tags::LEFT, rest).map(Envelope::Left),
        other => Err(DecodeError::UnknownTag(other.to_string())),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

fn parse<T: DeserializeOwned>(tag: &'static str, rest: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(rest).map_err(|source| DecodeError::Payload { tag, source })
}
