//! Token authentication configuration.

use serde::{Deserialize, Serialize};

/// Bearer token settings used at WebSocket upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT verification (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Claim holding the display name of the connecting user.
    #[serde(default = "default_username_claim")]
    pub username_claim: String,
    /// Whether tokens must carry an `exp` claim.
    #[serde(default)]
    pub require_expiry: bool,
    /// Lifetime of tokens issued by the `token` subcommand, in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            username_claim: default_username_claim(),
            require_expiry: false,
            token_ttl_minutes: default_token_ttl(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_username_claim() -> String {
    "userName".to_string()
}

fn default_token_ttl() -> u64 {
    60
}
