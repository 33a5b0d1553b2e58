//! Role-based path authorization.
//!
//! Unauthenticated callers are passed through untouched. Rejecting missing or
//! invalid tokens is the job of the authentication layer in front of this one;
//! routes that skip it are reachable by anyone.

use serde::Serialize;
use std::sync::Arc;

use crate::auth::registry::{starts_with_ignore_case, ClientRegistry};
use crate::auth::types::{Identity, ADMIN_ROLE};
use crate::observability::metrics;

/// Why a request was allowed or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Unauthenticated,
    AdminRole,
    PathAllowed,
    MissingClaims,
    UnknownClient,
    PathNotAllowed,
    NoAllowedPaths,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::AdminRole => "admin_role",
            Self::PathAllowed => "path_allowed",
            Self::MissingClaims => "missing_claims",
            Self::UnknownClient => "unknown_client",
            Self::PathNotAllowed => "path_not_allowed",
            Self::NoAllowedPaths => "no_allowed_paths",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub allow: bool,
    pub reason: DecisionReason,
}

impl AuthorizationDecision {
    fn allow(reason: DecisionReason) -> Self {
        Self { allow: true, reason }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self { allow: false, reason }
    }
}

/// Decides whether an identity may access a request path.
#[derive(Debug, Clone)]
pub struct PathAuthorizer {
    registry: Arc<ClientRegistry>,
}

impl PathAuthorizer {
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }

    pub fn authorize(&self, identity: Option<&Identity>, path: &str) -> AuthorizationDecision {
        let decision = self.decide(identity, path);
        metrics::record_authorization(decision.reason.as_str(), decision.allow);
        decision
    }

    fn decide(&self, identity: Option<&Identity>, path: &str) -> AuthorizationDecision {
        let Some(identity) = identity else {
            return AuthorizationDecision::allow(DecisionReason::Unauthenticated);
        };

        let role = identity.role().unwrap_or_default();
        if role.is_empty() || identity.subject.is_empty() {
            tracing::warn!(path, "Authorization denied: role or client id missing from token");
            return AuthorizationDecision::deny(DecisionReason::MissingClaims);
        }

        let Some(policy) = self.registry.find_by_subject_and_role(&identity.subject, role) else {
            tracing::warn!(client_id = %identity.subject, role, "Authorization denied: no matching client");
            return AuthorizationDecision::deny(DecisionReason::UnknownClient);
        };

        if policy.role == ADMIN_ROLE {
            tracing::debug!(client_id = %identity.subject, path, "Admin access granted");
            return AuthorizationDecision::allow(DecisionReason::AdminRole);
        }

        if policy.allowed.iter().all(|p| p.trim().is_empty()) {
            tracing::warn!(client_id = %identity.subject, role, "Authorization denied: no allowed paths configured");
            return AuthorizationDecision::deny(DecisionReason::NoAllowedPaths);
        }

        if policy
            .allowed
            .iter()
            .any(|prefix| path_matches(path, prefix))
        {
            tracing::debug!(client_id = %identity.subject, path, "Path access granted");
            AuthorizationDecision::allow(DecisionReason::PathAllowed)
        } else {
            tracing::warn!(client_id = %identity.subject, path, "Authorization denied: path not allowed");
            AuthorizationDecision::deny(DecisionReason::PathNotAllowed)
        }
    }
}

/// Leading slashes are ignored on both sides so `orders` matches `/orders/123`
/// and `/` matches every path.
fn path_matches(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim().trim_start_matches('/');
    starts_with_ignore_case(path.trim_start_matches('/'), prefix)
}
