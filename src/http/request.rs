//! Request identification and forwarding helpers.
//!
//! # Responsibilities
//! - Name the request ID header and build the per-request span
//! - Extract bearer tokens
//! - Rewrite an inbound request for a chosen backend
//!
//! # Design Decisions
//! - Request ID is assigned by tower-http before any handler runs
//! - `Host` is dropped so the client derives it from the backend URI

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

use crate::load_balancer::backend::Backend;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Header proving to downstream services that traffic came through the gateway.
pub const X_GATEWAY_SECRET: HeaderName = HeaderName::from_static("x-gateway-secret");

/// Assigns a UUID v4 to requests arriving without an `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID assigned to this request, or `"unknown"`.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span factory for `TraceLayer`.
pub fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request),
    )
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token<B>(request: &Request<B>) -> Option<&str> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Point `request` at `backend`, keeping path, query, method, and body.
pub fn rewrite_for_backend(
    request: Request<Body>,
    backend: &Backend,
    gateway_secret: Option<&HeaderValue>,
) -> Result<Request<Body>, axum::http::Error> {
    let (mut parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let uri: Uri = format!("http://{}:{}{}", backend.host(), backend.port(), path_and_query)
        .parse()
        .map_err(axum::http::Error::from)?;

    parts.uri = uri;
    parts.headers.remove(header::HOST);
    parts.headers.remove(header::CONNECTION);
    if let Some(secret) = gateway_secret {
        parts.headers.insert(X_GATEWAY_SECRET, secret.clone());
    }

    Ok(Request::from_parts(parts, body))
}
