//! WebSocket authentication — resolves a bearer token to a display name.

use std::sync::Arc;

use chathub_core::config::AuthConfig;
use chathub_core::error::AppError;

use crate::jwt::JwtDecoder;

/// Authenticated connection info extracted from a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedConnection {
    /// Display name of the connecting user.
    pub username: String,
}

/// Authenticates WebSocket connections using JWT tokens.
#[derive(Debug, Clone)]
pub struct WsAuthenticator {
    /// JWT decoder.
    decoder: Arc<JwtDecoder>,
    /// Claim holding the username.
    username_claim: String,
}

impl WsAuthenticator {
    /// Creates a new WebSocket authenticator.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            decoder: Arc::new(JwtDecoder::new(config)),
            username_claim: config.username_claim.clone(),
        }
    }

    /// Authenticates a connection using the token presented at upgrade.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedConnection, AppError> {
        let claims = self.decoder.decode(token.trim())?;
        let username = claims.username(&self.username_claim).ok_or_else(|| {
            AppError::authentication(format!(
                "Token is missing the '{}' claim",
                self.username_claim
            ))
        })?;

        tracing::debug!(username = %username, "Token authenticated");

        Ok(AuthenticatedConnection {
            username: username.to_string(),
        })
    }
}
