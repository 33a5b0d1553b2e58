//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; client policy is read-only at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Any load or validation failure aborts startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, BackendAddress, CircuitBreakerConfig, ClientPolicy, GatewayConfig,
    HealthProbeConfig, JwtConfig, ListenerConfig, ObservabilityConfig, RouteConfig,
    ServiceProviderConfig, TimeoutConfig,
};
pub use validation::ValidationError;
