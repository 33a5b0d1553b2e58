//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, path base).
    pub listener: ListenerConfig,

    /// Route definitions mapping request paths to backend sets.
    pub routes: Vec<RouteConfig>,

    /// Backend health probe settings.
    pub health_probe: HealthProbeConfig,

    /// Circuit breaker settings shared by every guarded call.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Defaults applied when building a load balancer for a route.
    pub service_provider: ServiceProviderConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Token signing settings and the client registry.
    pub jwt: JwtConfig,

    /// Shared secret forwarded to downstream services as `X-Gateway-Secret`.
    pub gateway_secret: Option<String>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional prefix every gateway endpoint is mounted under (e.g., "/api").
    pub path_base: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            path_base: None,
        }
    }
}

/// A single downstream address as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendAddress {
    pub host: String,
    pub port: u16,
}

/// Route configuration mapping a path prefix to an ordered backend list.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics and circuit keys.
    pub name: String,

    /// Path prefix to match.
    pub path_prefix: String,

    /// Candidates in preference order: index 0 is the primary, index 1 the backup.
    pub backends: Vec<BackendAddress>,

    /// Load balancer kind; falls back to `service_provider.default_load_balancer`.
    #[serde(default)]
    pub load_balancer: Option<String>,

    /// Require a valid bearer token on this route.
    #[serde(default)]
    pub authenticated: bool,
}

/// Defaults for load balancer construction.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceProviderConfig {
    /// Load balancer used by routes that do not name one.
    pub default_load_balancer: String,
}

impl Default for ServiceProviderConfig {
    fn default() -> Self {
        Self {
            default_load_balancer: "PrimaryBackup".to_string(),
        }
    }
}

/// Health probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthProbeConfig {
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,

    /// Health paths tried in order, relative to the backend root.
    pub paths: Vec<String>,
}

impl Default for HealthProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            paths: vec![
                "health".to_string(),
                "system/health".to_string(),
                "database/health".to_string(),
            ],
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Wrap proxied calls in the circuit breaker.
    pub enabled: bool,

    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Seconds an open circuit waits before admitting a trial call.
    pub open_timeout_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            open_timeout_secs: 60,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Symmetric HS256 signing key.
    pub key: String,

    /// `iss` claim written and required.
    pub issuer: String,

    /// `aud` claim written and required.
    pub audience: String,

    /// Token lifetime in hours.
    pub token_ttl_hours: i64,

    /// Registered clients allowed to exchange credentials for tokens.
    pub clients: Vec<ClientPolicy>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            issuer: "api-gateway".to_string(),
            audience: "api-gateway-clients".to_string(),
            token_ttl_hours: 8,
            clients: Vec::new(),
        }
    }
}

/// A registered client: credentials, role, and allowed path prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientPolicy {
    pub client_id: String,
    pub client_secret: String,
    pub role: String,
    #[serde(default)]
    pub allowed: Vec<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Default admin key; must be replaced before enabling the admin API.
pub const PLACEHOLDER_ADMIN_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin endpoints.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // Rejected by validation while admin is enabled.
            api_key: PLACEHOLDER_ADMIN_KEY.to_string(),
        }
    }
}
