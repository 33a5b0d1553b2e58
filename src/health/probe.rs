//! On-demand backend health probing.
//!
//! # Responsibilities
//! - Decide whether `host:port` can currently serve traffic
//! - Try each configured health path in order, then fall back to a bare TCP connect
//! - Bound every attempt by the per-attempt timeout
//!
//! # Decision Table
//! ```text
//! GET http://host:port/<path>
//!     2xx                       → healthy, stop
//!     non-2xx                   → try next path
//!     connect error / timeout   → unhealthy, stop
//! every path answered non-2xx   → TCP connect decides
//! ```

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;
use url::Url;

use crate::config::HealthProbeConfig;
use crate::observability::metrics;

/// Answers "can this backend serve traffic right now?".
///
/// Implementations never fail: every error reduces to `false`.
#[async_trait]
pub trait HealthProbe: Send + Sync + std::fmt::Debug {
    async fn is_healthy(&self, host: &str, port: u16) -> bool;
}

/// Outcome of a single HTTP probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Healthy,
    Rejected,
    Unreachable,
}

/// Probes backends over HTTP with a TCP connect fallback.
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: Client<HttpConnector, Body>,
    paths: Vec<String>,
    timeout: Duration,
}

impl HttpHealthProbe {
    pub fn new(paths: Vec<String>, timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            paths,
            timeout,
        }
    }

    pub fn from_config(config: &HealthProbeConfig) -> Self {
        Self::new(config.paths.clone(), Duration::from_secs(config.timeout_secs))
    }

    async fn attempt(&self, uri: &str) -> Attempt {
        let request = match Request::builder()
            .method("GET")
            .uri(uri)
            .header("user-agent", "api-gateway-health-probe")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::debug!(uri = %uri, error = %e, "Invalid health probe request");
                return Attempt::Unreachable;
            }
        };

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status().is_success() => Attempt::Healthy,
            Ok(Ok(response)) => {
                tracing::debug!(uri = %uri, status = %response.status(), "Health endpoint rejected probe");
                Attempt::Rejected
            }
            Ok(Err(e)) => {
                tracing::debug!(uri = %uri, error = %e, "Health probe failed: connection error");
                Attempt::Unreachable
            }
            Err(_) => {
                tracing::debug!(uri = %uri, "Health probe failed: timeout");
                Attempt::Unreachable
            }
        }
    }

    async fn port_open(&self, host: &str, port: u16) -> bool {
        match time::timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(host, port, error = %e, "TCP connect failed");
                false
            }
            Err(_) => {
                tracing::debug!(host, port, "TCP connect timed out");
                false
            }
        }
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn is_healthy(&self, host: &str, port: u16) -> bool {
        let healthy = 'probe: {
            for path in &self.paths {
                let Some(uri) = probe_url(host, port, path) else {
                    tracing::debug!(host, port, path = %path, "Cannot build health probe URL");
                    break 'probe false;
                };

                match self.attempt(&uri).await {
                    Attempt::Healthy => {
                        tracing::debug!(uri = %uri, "Health check succeeded");
                        break 'probe true;
                    }
                    Attempt::Unreachable => break 'probe false,
                    Attempt::Rejected => continue,
                }
            }

            tracing::debug!(host, port, "No health endpoint succeeded, trying TCP connect");
            self.port_open(host, port).await
        };

        metrics::record_backend_health(&format!("{}:{}", host, port), healthy);
        healthy
    }
}

/// Build `http://host:port/<path>`; leading slashes on `path` are ignored.
fn probe_url(host: &str, port: u16, path: &str) -> Option<String> {
    let base = Url::parse(&format!("http://{}:{}/", host, port)).ok()?;
    base.join(path.trim_start_matches('/')).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer 200 for paths listed in `ok_paths` and 404 otherwise, counting requests.
    async fn spawn_backend(ok_paths: &'static [&'static str]) -> (u16, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let counter = counter.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let head = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                    if n > 0 {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                    let status = if ok_paths.contains(&path.as_str()) {
                        "200 OK"
                    } else {
                        "404 Not Found"
                    };
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        status
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (port, hits)
    }

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn probe() -> HttpHealthProbe {
        HttpHealthProbe::from_config(&HealthProbeConfig::default())
    }

    #[test]
    fn test_probe_url() {
        assert_eq!(
            probe_url("10.0.0.1", 8080, "system/health").as_deref(),
            Some("http://10.0.0.1:8080/system/health")
        );
        assert_eq!(
            probe_url("localhost", 8081, "/health").as_deref(),
            Some("http://localhost:8081/health")
        );
        assert!(probe_url("bad host", 80, "health").is_none());
    }

    #[tokio::test]
    async fn test_first_successful_path_wins() {
        let (port, hits) = spawn_backend(&["/health"]).await;
        assert!(probe().is_healthy("127.0.0.1", port).await);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_later_path_succeeds() {
        let (port, hits) = spawn_backend(&["/database/health"]).await;
        assert!(probe().is_healthy("127.0.0.1", port).await);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_all_paths_rejected_falls_back_to_tcp() {
        let (port, hits) = spawn_backend(&[]).await;
        assert!(probe().is_healthy("127.0.0.1", port).await);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_connection_refused_is_unhealthy() {
        let port = closed_port().await;
        assert!(!probe().is_healthy("127.0.0.1", port).await);
    }

    #[tokio::test]
    async fn test_silent_backend_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let probe = HttpHealthProbe::new(vec!["health".into()], Duration::from_millis(200));
        let started = std::time::Instant::now();
        assert!(!probe.is_healthy("127.0.0.1", port).await);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
