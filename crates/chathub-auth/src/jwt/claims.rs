//! JWT claims carried by connection tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims payload of a connection token.
///
/// Only the registered time claims are typed; the display name lives under a
/// configurable claim key and is read with [`Claims::username`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Issued-at timestamp (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiration timestamp (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Remaining claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Builds claims for `username` stored under `claim`, expiring at `expires_at`.
    pub fn for_user(claim: &str, username: &str, expires_at: DateTime<Utc>) -> Self {
        let mut extra = Map::new();
        extra.insert(claim.to_string(), Value::String(username.to_string()));
        Self {
            iat: Some(Utc::now().timestamp()),
            exp: Some(expires_at.timestamp()),
            extra,
        }
    }

    /// Returns the non-empty string stored under `claim`.
    pub fn username(&self, claim: &str) -> Option<&str> {
        self.extra
            .get(claim)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Returns the expiration as a `DateTime<Utc>`, if present.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_reads_configured_claim() {
        let claims: Claims =
            serde_json::from_str(r#"{"userName":"alice","role":"member"}"#).expect("claims");
        assert_eq!(claims.username("userName"), Some("alice"));
        assert_eq!(claims.username("sub"), None);
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_blank_username_rejected() {
        let claims: Claims = serde_json::from_str(r#"{"userName":"   "}"#).expect("claims");
        assert_eq!(claims.username("userName"), None);
    }
}
