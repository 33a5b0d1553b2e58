//! Token issuance for registered clients.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::fmt;
use std::sync::Arc;

use crate::auth::claims::TokenClaims;
use crate::auth::registry::ClientRegistry;
use crate::auth::types::{AuthError, AuthResult, ADMIN_ROLE, USER_ROLE};
use crate::config::JwtConfig;
use crate::observability::metrics;

/// A signed access token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub access_token: String,
    pub claims: TokenClaims,
}

/// Exchanges client credentials for HS256-signed access tokens.
pub struct TokenIssuer {
    registry: Arc<ClientRegistry>,
    encoding_key: EncodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_hours", &self.ttl.num_hours())
            .field("clients", &self.registry.len())
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(config: &JwtConfig, registry: Arc<ClientRegistry>) -> AuthResult<Self> {
        if config.key.is_empty() {
            return Err(AuthError::Configuration("JWT signing key not configured".to_string()));
        }
        if config.token_ttl_hours <= 0 {
            return Err(AuthError::Configuration(format!(
                "token_ttl_hours must be positive, got {}",
                config.token_ttl_hours
            )));
        }

        Ok(Self {
            registry,
            encoding_key: EncodingKey::from_secret(config.key.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::hours(config.token_ttl_hours),
        })
    }

    /// Issue a token valid from now for the configured lifetime.
    pub fn issue(&self, client_id: &str, client_secret: &str) -> AuthResult<SignedToken> {
        self.issue_at(client_id, client_secret, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        client_id: &str,
        client_secret: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<SignedToken> {
        if client_id.is_empty() || client_secret.is_empty() {
            tracing::warn!("Empty client ID or secret provided");
            metrics::record_token_issued("rejected");
            return Err(AuthError::Unauthorized("Client ID and secret are required"));
        }

        let Some(client) = self.registry.find_by_credentials(client_id, client_secret) else {
            tracing::warn!(client_id, "Invalid client credentials");
            metrics::record_token_issued("rejected");
            return Err(AuthError::Unauthorized("Invalid client credentials"));
        };

        let mut roles = vec![client.role.clone()];
        if client.role == ADMIN_ROLE {
            roles.push(USER_ROLE.to_string());
        }

        let allowed = (!client.allowed.is_empty()).then(|| client.allowed.join(","));

        let claims = TokenClaims {
            sub: client_id.to_string(),
            roles,
            allowed,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            nbf: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::Signing)?;

        tracing::info!(client_id, role = %client.role, "Token issued");
        metrics::record_token_issued("issued");
        Ok(SignedToken {
            access_token,
            claims,
        })
    }
}
