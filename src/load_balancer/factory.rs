//! Load balancer construction per route.

use std::sync::Arc;

use crate::config::{RouteConfig, ServiceProviderConfig};
use crate::health::HealthProbe;
use crate::load_balancer::{
    backend::{Backend, BackendSet},
    FailoverSelector, LoadBalancer, LoadBalancerError,
};

/// Builds the load balancer for a route. Failures are returned, never raised.
pub trait LoadBalancerFactory: Send + Sync {
    fn get(
        &self,
        route: &RouteConfig,
        provider: &ServiceProviderConfig,
    ) -> Result<Arc<dyn LoadBalancer>, LoadBalancerError>;
}

/// Factory for primary/backup failover selectors sharing one health probe.
#[derive(Debug, Clone)]
pub struct PrimaryBackupFactory {
    probe: Arc<dyn HealthProbe>,
}

impl PrimaryBackupFactory {
    pub fn new(probe: Arc<dyn HealthProbe>) -> Self {
        Self { probe }
    }
}

impl LoadBalancerFactory for PrimaryBackupFactory {
    fn get(
        &self,
        route: &RouteConfig,
        provider: &ServiceProviderConfig,
    ) -> Result<Arc<dyn LoadBalancer>, LoadBalancerError> {
        let kind = route
            .load_balancer
            .as_deref()
            .unwrap_or(&provider.default_load_balancer);

        if !kind.eq_ignore_ascii_case(FailoverSelector::KIND) {
            tracing::error!(route = %route.name, kind, "Unsupported load balancer");
            return Err(LoadBalancerError::UnknownLoadBalancer {
                route: route.name.clone(),
                kind: kind.to_string(),
            });
        }

        let mut backends = Vec::with_capacity(route.backends.len());
        for addr in &route.backends {
            if addr.host.trim().is_empty() || addr.port == 0 {
                return Err(LoadBalancerError::InvalidBackend {
                    route: route.name.clone(),
                    address: format!("{}:{}", addr.host, addr.port),
                });
            }
            backends.push(Backend::from(addr));
        }

        tracing::info!(route = %route.name, count = backends.len(), "Creating failover selector");
        Ok(Arc::new(FailoverSelector::new(
            BackendSet::new(backends),
            self.probe.clone(),
        )))
    }
}
