//! Bearer token authentication.
//!
//! A valid token attaches an [`Identity`] to the request extensions. An
//! invalid token is rejected with 401. A missing token is only rejected on
//! routes configured as `authenticated`.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::Identity;
use crate::http::request::{bearer_token, request_id};
use crate::http::server::AppState;

/// Optional authentication for proxied routes.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let route_requires_token = state
        .routes
        .match_path(&path)
        .is_some_and(|route| route.authenticated);

    match identify(&state, &request) {
        Ok(Some(identity)) => {
            request.extensions_mut().insert(identity);
        }
        Ok(None) if route_requires_token => {
            tracing::warn!(request_id = %request_id(&request), path = %path, "Missing bearer token");
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Ok(None) => {}
        Err(status) => return status.into_response(),
    }

    next.run(request).await
}

/// Mandatory authentication, for endpoints that only make sense with a token.
pub async fn require_authentication(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match identify(&state, &request) {
        Ok(Some(identity)) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Ok(None) | Err(_) => StatusCode::UNAUTHORIZED.into_response(),
    }
}

fn identify(state: &AppState, request: &Request<Body>) -> Result<Option<Identity>, StatusCode> {
    let Some(token) = bearer_token(request) else {
        return Ok(None);
    };

    match state.validator.validate(token) {
        Ok(identity) => {
            tracing::debug!(client_id = %identity.subject, role = ?identity.role(), "Token accepted");
            Ok(Some(identity))
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id(request), error = %e, "Rejected bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
