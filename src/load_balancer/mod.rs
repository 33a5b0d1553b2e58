//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → route name identified
//!     → pool.rs (load balancer built for that route)
//!     → failover.rs (probe primary, fall back to backup)
//!     → Return backend or NoBackendsAvailable
//! ```
//!
//! # Design Decisions
//! - One load balancer per route, built once at startup by factory.rs
//! - Health is probed on every lease; nothing is cached between calls
//! - Availability wins: a lone unhealthy backend is still returned

pub mod backend;
pub mod factory;
pub mod failover;
pub mod pool;

use async_trait::async_trait;
use thiserror::Error;

use crate::load_balancer::backend::{Backend, BackendSet};

pub use factory::{LoadBalancerFactory, PrimaryBackupFactory};
pub use failover::FailoverSelector;
pub use pool::BalancerPool;

/// Errors raised while building or using a load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadBalancerError {
    /// The backend set is empty.
    #[error("No backends available")]
    NoBackendsAvailable,

    /// The route asked for a load balancer kind this gateway does not provide.
    #[error("Unknown load balancer '{kind}' for route '{route}'")]
    UnknownLoadBalancer { route: String, kind: String },

    /// A configured backend cannot be addressed.
    #[error("Invalid backend '{address}' for route '{route}'")]
    InvalidBackend { route: String, address: String },
}

/// Trait for backend selection strategies.
#[async_trait]
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Strategy name, as written in configuration.
    fn kind(&self) -> &'static str;

    /// Pick the backend for the next request.
    async fn lease(&self) -> Result<Backend, LoadBalancerError>;

    /// Hand a leased backend back. Reserved for connection accounting.
    fn release(&self, backend: &Backend);

    /// The candidates this balancer chooses from.
    fn backends(&self) -> &BackendSet;
}
