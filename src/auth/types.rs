//! Auth error definitions and the authenticated identity.

use thiserror::Error;

use crate::auth::claims::TokenClaims;

/// Role that bypasses path checks.
pub const ADMIN_ROLE: &str = "admin";

/// Marker role added to every admin token.
pub const USER_ROLE: &str = "user";

/// Errors that can occur during token issuance or validation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or unknown client credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Token failed signature, issuer, audience, or time checks.
    #[error("Invalid token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    /// Token could not be signed.
    #[error("Token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Signing settings unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Caller identity extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Client identifier (`sub`).
    pub subject: String,
    /// Role claims in token order; the first is the client's actual role.
    pub roles: Vec<String>,
    /// Allowed path prefixes carried by the token. Informational only, for
    /// handlers and downstream consumers; authorization always uses the
    /// registry policy for `(subject, role)`.
    pub allowed: Vec<String>,
}

impl Identity {
    /// The client's actual role, if any.
    pub fn role(&self) -> Option<&str> {
        self.roles.first().map(String::as_str)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        let allowed = claims
            .allowed
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            subject: claims.sub,
            roles: claims.roles,
            allowed,
        }
    }
}
