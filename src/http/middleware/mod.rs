//! Middleware for the proxied surface and the token endpoints.
//!
//! Order on proxied routes: authentication → authorization → proxy handler.

pub mod authentication;
pub mod authorization;

pub use authentication::{authenticate, require_authentication};
pub use authorization::authorize;
