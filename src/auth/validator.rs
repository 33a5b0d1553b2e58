//! Access token validation.
//!
//! Tokens are stateless: validity is recomputed from the signature and the
//! embedded timestamps on every call.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::fmt;

use crate::auth::claims::TokenClaims;
use crate::auth::types::{AuthError, AuthResult, Identity};
use crate::config::JwtConfig;

/// Verifies HS256 tokens issued by [`TokenIssuer`](crate::auth::TokenIssuer).
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator")
            .field("issuer", &self.validation.iss)
            .field("audience", &self.validation.aud)
            .finish()
    }
}

impl TokenValidator {
    pub fn new(config: &JwtConfig) -> AuthResult<Self> {
        if config.key.is_empty() {
            return Err(AuthError::Configuration("JWT signing key not configured".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud"]);
        validation.validate_nbf = true;
        validation.leeway = 0;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(config.key.as_bytes()),
            validation,
        })
    }

    /// Check signature, issuer, audience, and lifetime; return the caller identity.
    pub fn validate(&self, token: &str) -> AuthResult<Identity> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(AuthError::InvalidToken)?;
        Ok(Identity::from(data.claims))
    }

    /// Validate and additionally require the token to belong to `client_id`.
    pub fn validate_for(&self, token: &str, client_id: &str) -> bool {
        if token.is_empty() || client_id.is_empty() {
            tracing::warn!("Token validation failed: empty token or client ID");
            return false;
        }

        match self.validate(token) {
            Ok(identity) if identity.subject == client_id => true,
            Ok(identity) => {
                tracing::warn!(token_client = %identity.subject, expected = %client_id, "Token client ID mismatch");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token validation error");
                false
            }
        }
    }
}
