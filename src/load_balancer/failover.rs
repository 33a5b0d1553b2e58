//! Primary/backup failover selection.

use async_trait::async_trait;
use std::sync::Arc;

use crate::health::HealthProbe;
use crate::load_balancer::{
    backend::{Backend, BackendSet},
    LoadBalancer, LoadBalancerError,
};
use crate::observability::metrics;

/// Routes to the primary while it is healthy, otherwise to the backup.
///
/// The backup is never probed: it is the last resort whatever its state.
#[derive(Debug)]
pub struct FailoverSelector {
    backends: BackendSet,
    probe: Arc<dyn HealthProbe>,
}

impl FailoverSelector {
    pub const KIND: &'static str = "PrimaryBackup";

    pub fn new(backends: BackendSet, probe: Arc<dyn HealthProbe>) -> Self {
        tracing::info!(count = backends.len(), "Failover selector initialized");
        for (i, backend) in backends.as_slice().iter().enumerate() {
            let role = match i {
                0 => "primary",
                1 => "backup",
                _ => "unused",
            };
            tracing::info!(role, backend = %backend, "Failover candidate");
        }

        Self { backends, probe }
    }

    /// Probe the primary once and pick a backend.
    pub async fn select(&self) -> Result<Backend, LoadBalancerError> {
        let Some(primary) = self.backends.primary() else {
            tracing::error!("No backends available for load balancing");
            return Err(LoadBalancerError::NoBackendsAvailable);
        };

        if self.probe.is_healthy(primary.host(), primary.port()).await {
            tracing::debug!(backend = %primary, "Routing to primary");
            return Ok(primary.clone());
        }

        if let Some(backup) = self.backends.backup() {
            tracing::warn!(primary = %primary, backup = %backup, "Primary unhealthy, routing to backup");
            metrics::record_failover(&primary.to_string(), &backup.to_string());
            return Ok(backup.clone());
        }

        tracing::error!(backend = %primary, "Primary is unhealthy and no backup available, returning primary anyway");
        Ok(primary.clone())
    }
}

#[async_trait]
impl LoadBalancer for FailoverSelector {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    async fn lease(&self) -> Result<Backend, LoadBalancerError> {
        self.select().await
    }

    fn release(&self, backend: &Backend) {
        tracing::debug!(backend = %backend, "Released");
    }

    fn backends(&self) -> &BackendSet {
        &self.backends
    }
}
