//! API gateway library: primary/backup failover, circuit breaking,
//! client-credential tokens, and role-based path authorization in front of
//! HTTP backends.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Traffic management
pub mod health;
pub mod load_balancer;

// Security
pub mod auth;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
