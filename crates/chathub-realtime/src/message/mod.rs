//! Self-describing message envelope, payload types, codec, and validation.

pub mod builder;
pub mod codec;
pub mod envelope;
pub mod types;
pub mod validator;

pub use codec::{DecodeError, decode, encode};
pub use envelope::Envelope;
