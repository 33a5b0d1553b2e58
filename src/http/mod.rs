//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout, path base)
//!     → handlers.rs (/health, /auth/token, /auth/verify)
//!     → middleware/ (bearer authentication, path authorization)
//!     → proxy.rs (route → backend → circuit-guarded forward)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod proxy;
pub mod request;
pub mod server;

pub use request::{X_GATEWAY_SECRET, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
