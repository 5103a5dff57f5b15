//! # chathub-auth
//!
//! Token authentication for ChatHub WebSocket connections.
//!
//! ## Modules
//!
//! - `jwt` — HS256 token validation and development token issuing
//! - `authenticator` — resolves an upgrade request's token to a display name

pub mod authenticator;
pub mod jwt;

pub use authenticator::{AuthenticatedConnection, WsAuthenticator};
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
