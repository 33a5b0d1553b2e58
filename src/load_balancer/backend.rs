//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single downstream instance (host + port)
//! - Hold the ordered primary/backup candidate list for one route
//! - Flag degraded sets (no backup) at construction

use serde::Serialize;
use std::fmt;

use crate::config::BackendAddress;

/// A single downstream instance. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Backend {
    host: String,
    port: u16,
}

impl Backend {
    /// Create a new backend.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl From<&BackendAddress> for Backend {
    fn from(addr: &BackendAddress) -> Self {
        Self::new(addr.host.clone(), addr.port)
    }
}

/// Ordered candidates for one route: index 0 is the primary, index 1 the backup.
///
/// Entries past the backup are retained but never selected by the failover policy.
#[derive(Debug, Clone)]
pub struct BackendSet {
    backends: Vec<Backend>,
    degraded: bool,
}

impl BackendSet {
    /// Create a backend set, warning when there is no backup.
    pub fn new(backends: Vec<Backend>) -> Self {
        let degraded = backends.len() < 2;
        if degraded {
            tracing::warn!(
                count = backends.len(),
                "Backend set initialized with fewer than 2 backends (expected primary + backup)"
            );
        }
        Self { backends, degraded }
    }

    pub fn primary(&self) -> Option<&Backend> {
        self.backends.first()
    }

    pub fn backup(&self) -> Option<&Backend> {
        self.backends.get(1)
    }

    /// True when the set was built without a backup.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn as_slice(&self) -> &[Backend] {
        &self.backends
    }
}
