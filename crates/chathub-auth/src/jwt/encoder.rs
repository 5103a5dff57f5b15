//! JWT token creation for development and testing.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};

use chathub_core::config::AuthConfig;
use chathub_core::error::AppError;

use super::claims::Claims;

/// Creates signed connection tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Claim the username is written under.
    username_claim: String,
    /// Token TTL in minutes.
    ttl_minutes: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("username_claim", &self.username_claim)
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            username_claim: config.username_claim.clone(),
            ttl_minutes: config.token_ttl_minutes as i64,
        }
    }

    /// Issues a token identifying `username`.
    pub fn issue(&self, username: &str) -> Result<String, AppError> {
        let expires_at = Utc::now() + chrono::Duration::minutes(self.ttl_minutes);
        let claims = Claims::for_user(&self.username_claim, username, expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Token signing failed: {e}")))
    }
}
