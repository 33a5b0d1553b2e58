//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (route lookup, longest prefix first)
//!     → matcher.rs (segment-aware prefix test)
//!     → Return: matched route or None
//!
//! Route compilation (at startup):
//!     RouteConfig[]
//!     → Normalize prefixes
//!     → Sort by prefix length
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use matcher::PathPrefixMatcher;
pub use router::{MatchedRoute, RouteTable};
