//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! FailoverSelector::select()
//!     → probe.rs (HTTP health paths, then TCP connect)
//!     → bool verdict, never an error
//! ```
//!
//! # Design Decisions
//! - Probing is on demand, once per selection; results are not cached
//! - Every attempt is bounded by the configured timeout
//! - Network errors are absorbed here and never reach callers

pub mod probe;

pub use probe::{HealthProbe, HttpHealthProbe};
