//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Guarded call (e.g. proxied request to a backend):
//!     → circuit_breaker.rs (admit, or short-circuit to the fallback / CircuitError::Open)
//!     → operation runs
//!     → success/failure recorded against the circuit key
//! ```
//!
//! # Design Decisions
//! - Circuit state is per process, not shared across gateway instances
//! - The breaker is an injectable handle owned by the composition root
//! - `execute` swallows errors and panics into the fallback; `call` returns
//!   the counted error to callers that need to relay it

pub mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, CircuitError, CircuitSnapshot, CircuitState};
