//! Reverse proxy handler.
//!
//! # Data Flow
//! ```text
//! Request (already authenticated and authorized)
//!     → RouteTable::match_path        (404 when nothing matches)
//!     → LoadBalancer::lease           (503 when no backend)
//!     → CircuitBreaker::call          (503 while open)
//!     → hyper-util client → backend   (502 on transport error)
//! ```
//!
//! Transport errors and 502/503/504 answers count as failures for the circuit.
//! A counted 502/503/504 is still relayed to the client as the backend sent it.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use std::time::Instant;
use thiserror::Error;

use crate::http::request::{request_id, rewrite_for_backend};
use crate::http::server::AppState;
use crate::load_balancer::backend::Backend;
use crate::observability::metrics;
use crate::resilience::CircuitError;

/// Why a forwarded call counts as failed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("upstream answered {}", .0.status())]
    Status(Response),
}

/// Circuit key for one backend of one route.
pub fn circuit_key(route: &str, backend: &Backend) -> String {
    format!("{}@{}", route, backend)
}

pub fn is_upstream_failure(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

pub async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request_id(&request).to_string();

    let Some(route) = state.routes.match_path(&path) else {
        tracing::warn!(request_id = %request_id, path = %path, "No route matched");
        metrics::record_request(&method, 404, "none", start);
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };
    let route_name = route.name.to_string();

    let Some(balancer) = state.balancers.get(&route_name) else {
        tracing::error!(request_id = %request_id, route = %route_name, "Route has no load balancer");
        metrics::record_request(&method, 503, "none", start);
        return (StatusCode::SERVICE_UNAVAILABLE, "No backends available").into_response();
    };

    let backend = match balancer.lease().await {
        Ok(backend) => backend,
        Err(e) => {
            tracing::warn!(request_id = %request_id, route = %route_name, error = %e, "Backend selection failed");
            metrics::record_request(&method, 503, "none", start);
            return (StatusCode::SERVICE_UNAVAILABLE, "No backends available").into_response();
        }
    };
    let backend_addr = backend.to_string();

    tracing::debug!(
        request_id = %request_id,
        route = %route_name,
        backend = %backend_addr,
        "Proxying request"
    );

    let upstream = match rewrite_for_backend(request, &backend, state.gateway_secret.as_ref()) {
        Ok(upstream) => upstream,
        Err(e) => {
            balancer.release(&backend);
            tracing::error!(request_id = %request_id, error = %e, "Could not build upstream request");
            metrics::record_request(&method, 502, &backend_addr, start);
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    let key = circuit_key(&route_name, &backend);
    let client = state.client.clone();
    let outcome = if state.circuit_enabled {
        state
            .circuit_breaker
            .call(&key, || forward(&client, upstream))
            .await
    } else {
        send(&client, upstream).await.map_err(CircuitError::Failed)
    };

    balancer.release(&backend);

    let response = match outcome {
        Ok(response) => response,
        Err(CircuitError::Open) => {
            (StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable").into_response()
        }
        Err(CircuitError::Failed(UpstreamError::Status(response))) => {
            tracing::warn!(request_id = %request_id, backend = %backend_addr, status = %response.status(), "Upstream answered with failure");
            response
        }
        Err(CircuitError::Failed(e)) => {
            tracing::warn!(request_id = %request_id, backend = %backend_addr, error = %e, "Upstream call failed");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
        Err(CircuitError::Panicked) => {
            tracing::error!(request_id = %request_id, backend = %backend_addr, "Upstream call panicked");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), &backend_addr, start);
    response
}

/// Send and classify: 502/503/504 answers come back as `UpstreamError::Status`.
async fn forward(
    client: &Client<HttpConnector, Body>,
    request: Request<Body>,
) -> Result<Response, UpstreamError> {
    let response = send(client, request).await?;
    if is_upstream_failure(response.status()) {
        return Err(UpstreamError::Status(response));
    }
    Ok(response)
}

async fn send(
    client: &Client<HttpConnector, Body>,
    request: Request<Body>,
) -> Result<Response, UpstreamError> {
    let response: hyper::Response<Incoming> = client.request(request).await?;
    Ok(response.map(Body::new))
}
