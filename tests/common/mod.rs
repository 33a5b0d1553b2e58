//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use api_gateway::config::{BackendAddress, ClientPolicy, GatewayConfig, RouteConfig};
use api_gateway::http::HttpServer;
use api_gateway::lifecycle::Shutdown;

pub const GATEWAY_SECRET: &str = "integration-secret";

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Mock HTTP backend on an ephemeral port that records every request.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockBackend {
    /// Every request seen, probes included.
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    /// Requests whose path does not end in `health`.
    pub fn traffic(&self) -> Vec<SeenRequest> {
        self.requests()
            .into_iter()
            .filter(|r| !r.path.ends_with("health"))
            .collect()
    }

    pub fn address(&self) -> BackendAddress {
        BackendAddress {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
        }
    }
}

/// Start a backend whose answer depends on the request path.
/// 503 answers carry `Retry-After: 30`.
pub async fn start_backend<F>(respond: F) -> MockBackend
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let recorded = seen.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let respond = respond.clone();
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                let (status, body) = respond(&request.path);
                recorded.lock().unwrap().push(request);

                let retry_after = if status == 503 { "Retry-After: 30\r\n" } else { "" };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n{}",
                    status,
                    reason(status),
                    body.len(),
                    retry_after,
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockBackend { addr, seen }
}

/// Backend answering 200 everywhere with a fixed body.
pub async fn start_named_backend(name: &'static str) -> MockBackend {
    start_backend(move |_| (200, name.to_string())).await
}

/// An address nothing listens on.
pub async fn unreachable_address() -> BackendAddress {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    BackendAddress {
        host: addr.ip().to_string(),
        port: addr.port(),
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<SeenRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    Some(SeenRequest {
        method,
        path,
        headers,
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

pub fn route(name: &str, prefix: &str, backends: Vec<BackendAddress>, authenticated: bool) -> RouteConfig {
    RouteConfig {
        name: name.into(),
        path_prefix: prefix.into(),
        backends,
        load_balancer: None,
        authenticated,
    }
}

/// Valid configuration with the `acme`, `root`, and `guest` clients and no routes.
pub fn base_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.jwt.key = "integration-signing-key-0123456789abcdef".into();
    config.jwt.clients = vec![
        ClientPolicy {
            client_id: "acme".into(),
            client_secret: "secret1".into(),
            role: "user".into(),
            allowed: vec!["reports".into()],
        },
        ClientPolicy {
            client_id: "root".into(),
            client_secret: "toor".into(),
            role: "admin".into(),
            allowed: vec![],
        },
        ClientPolicy {
            client_id: "guest".into(),
            client_secret: "guest".into(),
            role: "viewer".into(),
            allowed: vec![],
        },
    ];
    config.health_probe.timeout_secs = 1;
    config.gateway_secret = Some(GATEWAY_SECRET.into());
    config.admin.api_key = "admin-key".into();
    config
}

/// A gateway running on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub base: String,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}{}", self.addr, self.base, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_gateway(config: GatewayConfig) -> TestGateway {
    let base = config.listener.path_base.clone().unwrap_or_default();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).expect("gateway should start");
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestGateway {
        addr,
        base,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Exchange credentials for a token, asserting success.
pub async fn fetch_token(gateway: &TestGateway, client_id: &str, client_secret: &str) -> String {
    let res = client()
        .post(gateway.url("/auth/token"))
        .query(&[("clientId", client_id), ("clientSecret", client_secret)])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let json: serde_json::Value = res.json().await.unwrap();
    json["accessToken"].as_str().unwrap().to_string()
}
