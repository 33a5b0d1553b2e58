//! Circuit breaker for guarding unreliable calls.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: target assumed down, calls return the fallback without running
//! - Half-Open: testing if the target recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Open → Half-Open: next call after open_timeout since the last failure
//! Half-Open → Closed: trial call succeeds (counter reset)
//! Half-Open → Open: trial call fails (last failure refreshed)
//! ```
//!
//! # Concurrency
//! - One record per key, created lazily, kept for the process lifetime
//! - Each transition and the increment that triggers it happen under the
//!   record's shard lock; the lock is never held while the guarded call runs
//! - Half-Open admission is best-effort: racing callers may all get through

use dashmap::DashMap;
use futures_util::FutureExt;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Circuit state for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure bookkeeping for one key. `Open` always has `last_failure` set.
#[derive(Debug, Clone)]
struct CircuitRecord {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

impl Default for CircuitRecord {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure: None,
        }
    }
}

/// Why a guarded call produced no value.
#[derive(Debug)]
pub enum CircuitError<E> {
    /// Short-circuited; the operation did not run.
    Open,
    /// The operation ran and returned an error, which was counted.
    Failed(E),
    /// The operation panicked; counted as a failure.
    Panicked,
}

/// Point-in-time view of a circuit, for admin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitSnapshot {
    pub key: String,
    pub state: CircuitState,
    pub failure_count: u32,
}

/// Keyed circuit breaker. Clones share the same records.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    records: Arc<DashMap<String, CircuitRecord>>,
    failure_threshold: u32,
    open_timeout: Duration,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

impl CircuitBreaker {
    /// Create a breaker; a threshold of 0 is treated as 1.
    pub fn new(failure_threshold: u32, open_timeout: Duration) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            failure_threshold: failure_threshold.max(1),
            open_timeout,
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(
            config.failure_threshold,
            Duration::from_secs(config.open_timeout_secs),
        )
    }

    /// Run `operation` under the circuit for `key`.
    ///
    /// Returns `fallback` without running the operation while the circuit is
    /// open, and in place of any error or panic the operation produces.
    pub async fn execute<T, E, F, Fut>(&self, key: &str, operation: F, fallback: T) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.call(key, operation).await.unwrap_or(fallback)
    }

    /// Like [`execute`](Self::execute), but hands back the counted error so
    /// the caller can tell a short-circuit from a failed call.
    pub async fn call<T, E, F, Fut>(&self, key: &str, operation: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        if !self.admit(key) {
            tracing::debug!(key, "Circuit breaker is OPEN, short-circuiting call");
            return Err(CircuitError::Open);
        }

        match AssertUnwindSafe(async move { operation().await })
            .catch_unwind()
            .await
        {
            Ok(Ok(value)) => {
                self.on_success(key);
                Ok(value)
            }
            Ok(Err(e)) => {
                self.on_failure(key, &e.to_string());
                Err(CircuitError::Failed(e))
            }
            Err(_) => {
                self.on_failure(key, "operation panicked");
                Err(CircuitError::Panicked)
            }
        }
    }

    /// Current state; keys never seen are `Closed`.
    pub fn state(&self, key: &str) -> CircuitState {
        self.records
            .get(key)
            .map(|r| r.state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Current consecutive failure count; 0 for keys never seen.
    pub fn failure_count(&self, key: &str) -> u32 {
        self.records.get(key).map(|r| r.failure_count).unwrap_or(0)
    }

    /// Force the circuit closed with a zero failure count.
    pub fn reset(&self, key: &str) {
        if let Some(mut record) = self.records.get_mut(key) {
            let previous = record.state;
            record.state = CircuitState::Closed;
            record.failure_count = 0;
            if previous != CircuitState::Closed {
                metrics::record_circuit_transition(key, CircuitState::Closed.as_str());
            }
            tracing::info!(key, "Circuit breaker manually reset");
        }
    }

    /// Every known circuit, sorted by key.
    pub fn snapshot(&self) -> Vec<CircuitSnapshot> {
        let mut circuits: Vec<_> = self
            .records
            .iter()
            .map(|entry| CircuitSnapshot {
                key: entry.key().clone(),
                state: entry.state,
                failure_count: entry.failure_count,
            })
            .collect();
        circuits.sort_by(|a, b| a.key.cmp(&b.key));
        circuits
    }

    /// Decide whether a call may run, moving Open → HalfOpen once the timeout has passed.
    fn admit(&self, key: &str) -> bool {
        let mut record = self.records.entry(key.to_string()).or_default();
        if record.state != CircuitState::Open {
            return true;
        }

        let expired = record
            .last_failure
            .map_or(true, |at| at.elapsed() >= self.open_timeout);
        if !expired {
            return false;
        }

        record.state = CircuitState::HalfOpen;
        metrics::record_circuit_transition(key, CircuitState::HalfOpen.as_str());
        tracing::info!(key, "Circuit breaker transitioning to HALF-OPEN");
        true
    }

    fn on_success(&self, key: &str) {
        let Some(mut record) = self.records.get_mut(key) else {
            return;
        };
        match record.state {
            CircuitState::HalfOpen => {
                record.state = CircuitState::Closed;
                record.failure_count = 0;
                metrics::record_circuit_transition(key, CircuitState::Closed.as_str());
                tracing::info!(key, "Circuit breaker CLOSED after successful operation");
            }
            CircuitState::Closed if record.failure_count > 0 => record.failure_count = 0,
            _ => {}
        }
    }

    fn on_failure(&self, key: &str, error: &str) {
        let mut record = self.records.entry(key.to_string()).or_default();
        record.failure_count = record.failure_count.saturating_add(1);
        record.last_failure = Some(Instant::now());

        match record.state {
            CircuitState::HalfOpen => {
                record.state = CircuitState::Open;
                metrics::record_circuit_transition(key, CircuitState::Open.as_str());
                tracing::info!(key, error, "Circuit breaker returned to OPEN after half-open failure");
            }
            CircuitState::Closed if record.failure_count >= self.failure_threshold => {
                record.state = CircuitState::Open;
                metrics::record_circuit_transition(key, CircuitState::Open.as_str());
                tracing::warn!(
                    key,
                    failures = record.failure_count,
                    error,
                    "Circuit breaker OPENED"
                );
            }
            CircuitState::Closed => {
                tracing::debug!(
                    key,
                    failures = record.failure_count,
                    threshold = self.failure_threshold,
                    error,
                    "Circuit breaker recorded failure"
                );
            }
            CircuitState::Open => {}
        }
    }
}
