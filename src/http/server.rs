//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (timeout, tracing, request ID)
//! - Mount everything under the optional path base
//! - Bind server to listener and shut down gracefully

use axum::{
    body::Body,
    http::HeaderValue,
    middleware,
    routing::{any, get, post},
    Router,
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::auth::{PathAuthorizer, TokenIssuer, TokenValidator};
use crate::config::GatewayConfig;
use crate::health::{HealthProbe, HttpHealthProbe};
use crate::http::handlers::{health, issue_token, verify_token};
use crate::http::middleware::{authenticate, authorize, require_authentication};
use crate::http::proxy::proxy_handler;
use crate::http::request::{make_request_span, UuidRequestId};
use crate::lifecycle::startup::{build_state, StartupError};
use crate::load_balancer::BalancerPool;
use crate::resilience::CircuitBreaker;
use crate::routing::RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub balancers: Arc<BalancerPool>,
    pub client: Client<HttpConnector, Body>,
    pub circuit_breaker: CircuitBreaker,
    pub circuit_enabled: bool,
    pub issuer: Arc<TokenIssuer>,
    pub validator: Arc<TokenValidator>,
    pub authorizer: Arc<PathAuthorizer>,
    pub gateway_secret: Option<HeaderValue>,
    pub admin_api_key: Arc<str>,
    pub started_at: Instant,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server that probes backends over HTTP.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let probe = Arc::new(HttpHealthProbe::from_config(&config.health_probe));
        Self::with_health_probe(config, probe)
    }

    /// Create a server with a caller-supplied health probe.
    pub fn with_health_probe(
        config: GatewayConfig,
        probe: Arc<dyn HealthProbe>,
    ) -> Result<Self, StartupError> {
        let state = build_state(&config, probe)?;
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let proxied = Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), authorize))
            .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

        let mut app = Router::new()
            .route("/health", get(health))
            .route("/auth/token", post(issue_token))
            .route(
                "/auth/verify",
                get(verify_token).route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    require_authentication,
                )),
            )
            .merge(proxied);

        if config.admin.enabled {
            app = app.merge(admin::router(state.clone()));
        }

        let app = app.with_state(state);
        let app = match config.listener.path_base.as_deref() {
            Some(base) => Router::new().nest(base, app),
            None => app,
        };

        app.layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path_base = ?self.config.listener.path_base,
            routes = self.config.routes.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendAddress, ClientPolicy, RouteConfig};
    use crate::load_balancer::failover::tests::ScriptedProbe;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.jwt.key = "k".repeat(32);
        config.jwt.clients = vec![
            ClientPolicy {
                client_id: "acme".into(),
                client_secret: "secret1".into(),
                role: "user".into(),
                allowed: vec!["reports".into()],
            },
            ClientPolicy {
                client_id: "guest".into(),
                client_secret: "guest".into(),
                role: "viewer".into(),
                allowed: vec![],
            },
        ];
        config.routes.push(RouteConfig {
            name: "reports".into(),
            path_prefix: "/reports".into(),
            // nothing listens on port 1
            backends: vec![BackendAddress { host: "127.0.0.1".into(), port: 1 }],
            load_balancer: None,
            authenticated: true,
        });
        config
    }

    fn server(config: GatewayConfig) -> HttpServer {
        HttpServer::with_health_probe(config, Arc::new(ScriptedProbe::default())).unwrap()
    }

    async fn token(router: &Router, base: &str, id: &str, secret: &str) -> String {
        let response = router
            .clone()
            .oneshot(
                Request::post(format!("{base}/auth/token?clientId={id}&clientSecret={secret}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        json["accessToken"].as_str().unwrap().to_string()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_has_request_id() {
        let router = server(config()).router();
        let response = router.oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_bad_credentials_unauthorized() {
        let router = server(config()).router();
        let response = router
            .oneshot(
                Request::post("/auth/token?clientId=acme&clientSecret=nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_verify_requires_token() {
        let router = server(config()).router();

        let response = router.clone().oneshot(get("/auth/verify", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let token = token(&router, "", "acme", "secret1").await;
        let response = router.oneshot(get("/auth/verify", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_proxied_route_guards() {
        let router = server(config()).router();

        let response = router.clone().oneshot(get("/reports/daily", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .clone()
            .oneshot(get("/reports/daily", Some("garbage")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let guest = token(&router, "", "guest", "guest").await;
        let response = router.clone().oneshot(get("/reports/daily", Some(&guest))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // authorized, but the backend is down
        let acme = token(&router, "", "acme", "secret1").await;
        let response = router.clone().oneshot(get("/reports/daily", Some(&acme))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = router.oneshot(get("/nowhere", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_path_base() {
        let mut config = config();
        config.listener.path_base = Some("/api".into());
        let router = server(config).router();

        let response = router.clone().oneshot(get("/api/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router.clone().oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let token = token(&router, "/api", "acme", "secret1").await;
        let response = router.oneshot(get("/api/auth/verify", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
