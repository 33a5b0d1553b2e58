//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the signing key and client registry are usable
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Detect duplicate route names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, PLACEHOLDER_ADMIN_KEY};

/// Minimum HS256 key length in bytes.
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("jwt.key is missing")]
    MissingSigningKey,

    #[error("jwt.key must be at least {min} bytes, got {actual}")]
    SigningKeyTooShort { min: usize, actual: usize },

    #[error("jwt.{0} must not be empty")]
    EmptyJwtField(&'static str),

    #[error("jwt.token_ttl_hours must be positive")]
    InvalidTokenTtl,

    #[error("client #{index} has an empty {field}")]
    IncompleteClient { index: usize, field: &'static str },

    #[error("route #{0} has an empty name")]
    EmptyRouteName(usize),

    #[error("duplicate route name '{0}'")]
    DuplicateRoute(String),

    #[error("route '{0}' has no backends")]
    RouteWithoutBackends(String),

    #[error("route '{route}' has an invalid backend '{host}:{port}'")]
    InvalidBackend { route: String, host: String, port: u16 },

    #[error("circuit_breaker.failure_threshold must be at least 1")]
    InvalidFailureThreshold,

    #[error("health_probe.timeout_secs must be at least 1")]
    InvalidProbeTimeout,

    #[error("health_probe.paths must not be empty")]
    NoProbePaths,

    #[error("admin.api_key must not be empty when admin is enabled")]
    MissingAdminKey,

    #[error("admin.api_key is still the placeholder; set a real key to enable admin")]
    PlaceholderAdminKey,

    #[error("listener.path_base '{0}' must start with '/' and must not end with '/'")]
    InvalidPathBase(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(base) = &config.listener.path_base {
        if !base.starts_with('/') || base.ends_with('/') {
            errors.push(ValidationError::InvalidPathBase(base.clone()));
        }
    }

    let jwt = &config.jwt;
    if jwt.key.is_empty() {
        errors.push(ValidationError::MissingSigningKey);
    } else if jwt.key.len() < MIN_SIGNING_KEY_LEN {
        errors.push(ValidationError::SigningKeyTooShort {
            min: MIN_SIGNING_KEY_LEN,
            actual: jwt.key.len(),
        });
    }
    if jwt.issuer.trim().is_empty() {
        errors.push(ValidationError::EmptyJwtField("issuer"));
    }
    if jwt.audience.trim().is_empty() {
        errors.push(ValidationError::EmptyJwtField("audience"));
    }
    if jwt.token_ttl_hours <= 0 {
        errors.push(ValidationError::InvalidTokenTtl);
    }

    for (index, client) in jwt.clients.iter().enumerate() {
        for (field, value) in [
            ("client_id", &client.client_id),
            ("client_secret", &client.client_secret),
            ("role", &client.role),
        ] {
            if value.trim().is_empty() {
                errors.push(ValidationError::IncompleteClient { index, field });
            }
        }
    }

    let mut seen = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName(index));
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }

        if route.backends.is_empty() {
            errors.push(ValidationError::RouteWithoutBackends(route.name.clone()));
        }
        for backend in &route.backends {
            if backend.host.trim().is_empty() || backend.port == 0 {
                errors.push(ValidationError::InvalidBackend {
                    route: route.name.clone(),
                    host: backend.host.clone(),
                    port: backend.port,
                });
            }
        }
    }

    if config.circuit_breaker.failure_threshold == 0 {
        errors.push(ValidationError::InvalidFailureThreshold);
    }
    if config.health_probe.timeout_secs == 0 {
        errors.push(ValidationError::InvalidProbeTimeout);
    }
    if config.health_probe.paths.is_empty() {
        errors.push(ValidationError::NoProbePaths);
    }
    if config.admin.enabled {
        let key = config.admin.api_key.trim();
        if key.is_empty() {
            errors.push(ValidationError::MissingAdminKey);
        } else if key == PLACEHOLDER_ADMIN_KEY {
            errors.push(ValidationError::PlaceholderAdminKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{BackendAddress, ClientPolicy, RouteConfig};

    fn valid_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.jwt.key = "k".repeat(MIN_SIGNING_KEY_LEN);
        config.jwt.clients.push(ClientPolicy {
            client_id: "acme".into(),
            client_secret: "secret1".into(),
            role: "user".into(),
            allowed: vec!["reports".into()],
        });
        config.routes.push(RouteConfig {
            name: "reports".into(),
            path_prefix: "/reports".into(),
            backends: vec![BackendAddress { host: "127.0.0.1".into(), port: 9000 }],
            load_balancer: None,
            authenticated: false,
        });
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.jwt.key = "short".into();
        config.jwt.clients[0].role = String::new();
        let duplicate = config.routes[0].clone();
        config.routes.push(duplicate);
        config.routes[1].backends.clear();
        config.circuit_breaker.failure_threshold = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::SigningKeyTooShort { min: 32, actual: 5 }));
        assert!(errors.contains(&ValidationError::IncompleteClient { index: 0, field: "role" }));
        assert!(errors.contains(&ValidationError::DuplicateRoute("reports".into())));
        assert!(errors.contains(&ValidationError::RouteWithoutBackends("reports".into())));
        assert!(errors.contains(&ValidationError::InvalidFailureThreshold));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_missing_key_and_bad_backend() {
        let mut config = valid_config();
        config.jwt.key.clear();
        config.routes[0].backends[0].port = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0], ValidationError::MissingSigningKey);
        assert!(errors[1].to_string().contains("127.0.0.1:0"));
    }

    #[test]
    fn test_path_base_shape() {
        let mut config = valid_config();
        config.listener.path_base = Some("/api".into());
        assert!(validate_config(&config).is_ok());

        for bad in ["api", "/api/", "/"] {
            config.listener.path_base = Some(bad.into());
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors, vec![ValidationError::InvalidPathBase(bad.into())]);
        }
    }

    #[test]
    fn test_admin_key_required_when_enabled() {
        let mut config = valid_config();
        config.admin.enabled = true;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::PlaceholderAdminKey]
        );

        config.admin.api_key = "  ".into();
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::MissingAdminKey]
        );

        config.admin.api_key = "a-real-key".into();
        assert!(validate_config(&config).is_ok());

        // placeholder is harmless while admin stays off
        config.admin.enabled = false;
        config.admin.api_key = PLACEHOLDER_ADMIN_KEY.into();
        assert!(validate_config(&config).is_ok());
    }
}
