//! Access token claim set.

use serde::{Deserialize, Serialize};

/// Claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (client identifier)
    #[serde(default)]
    pub sub: String,
    /// Role claims; admin tokens carry `["admin", "user"]`
    #[serde(rename = "role", default)]
    pub roles: Vec<String>,
    /// Comma-joined allowed path prefixes, present only when configured
    #[serde(rename = "Allowed", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<String>,
    /// Token issuer
    pub iss: String,
    /// Token audience
    pub aud: String,
    /// Not valid before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}
