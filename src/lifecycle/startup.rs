//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated configuration into shared application state
//! - Initialize subsystems in dependency order
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use axum::http::HeaderValue;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::auth::{AuthError, ClientRegistry, PathAuthorizer, TokenIssuer, TokenValidator};
use crate::config::{ConfigError, GatewayConfig};
use crate::health::HealthProbe;
use crate::http::server::AppState;
use crate::load_balancer::{BalancerPool, LoadBalancerError, PrimaryBackupFactory};
use crate::resilience::CircuitBreaker;
use crate::routing::RouteTable;

/// Fatal errors that stop the gateway before it accepts traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("auth setup failed: {0}")]
    Auth(#[from] AuthError),

    #[error("load balancer setup failed: {0}")]
    LoadBalancer(#[from] LoadBalancerError),

    #[error("gateway_secret is not a valid header value")]
    InvalidGatewaySecret,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Build the shared state every handler sees.
pub fn build_state(
    config: &GatewayConfig,
    probe: Arc<dyn HealthProbe>,
) -> Result<AppState, StartupError> {
    let registry = Arc::new(ClientRegistry::new(config.jwt.clients.clone()));
    let issuer = TokenIssuer::new(&config.jwt, registry.clone())?;
    let validator = TokenValidator::new(&config.jwt)?;
    let authorizer = PathAuthorizer::new(registry.clone());
    tracing::info!(clients = registry.len(), "Client registry loaded");

    let factory = PrimaryBackupFactory::new(probe);
    let balancers = BalancerPool::build(&config.routes, &config.service_provider, &factory)?;
    let routes = RouteTable::new(&config.routes);
    tracing::info!(routes = routes.len(), "Routes compiled");

    let gateway_secret = match config.gateway_secret.as_deref() {
        Some(secret) => Some(
            HeaderValue::from_str(secret).map_err(|_| StartupError::InvalidGatewaySecret)?,
        ),
        None => {
            tracing::warn!("gateway_secret not set; downstream calls are not signed");
            None
        }
    };

    let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

    Ok(AppState {
        routes: Arc::new(routes),
        balancers: Arc::new(balancers),
        client,
        circuit_breaker: CircuitBreaker::from_config(&config.circuit_breaker),
        circuit_enabled: config.circuit_breaker.enabled,
        issuer: Arc::new(issuer),
        validator: Arc::new(validator),
        authorizer: Arc::new(authorizer),
        gateway_secret,
        admin_api_key: Arc::from(config.admin.api_key.as_str()),
        started_at: Instant::now(),
    })
}
