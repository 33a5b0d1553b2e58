//! Token issuance, validation, and path authorization.
//!
//! # Data Flow
//! ```text
//! POST /auth/token → issuer.rs (registry lookup, HS256 sign)
//!
//! Proxied request
//!     → validator.rs (bearer token → Identity)
//!     → authorizer.rs (Identity + path → allow/deny)
//! ```
//!
//! # Design Decisions
//! - Tokens are stateless; nothing is stored after issuance
//! - Client policy is read-only after startup
//! - Admins bypass path checks; everyone else needs a matching prefix

pub mod authorizer;
pub mod claims;
pub mod issuer;
pub mod registry;
pub mod types;
pub mod validator;

pub use authorizer::{AuthorizationDecision, DecisionReason, PathAuthorizer};
pub use claims::TokenClaims;
pub use issuer::{SignedToken, TokenIssuer};
pub use registry::ClientRegistry;
pub use types::{AuthError, AuthResult, Identity, ADMIN_ROLE, USER_ROLE};
pub use validator::TokenValidator;
