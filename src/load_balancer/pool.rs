//! Per-route load balancer pool.
//!
//! # Responsibilities
//! - Build one load balancer per configured route at startup
//! - Look balancers up by route name on the request path
//! - Expose every balancer for the admin API

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{RouteConfig, ServiceProviderConfig};
use crate::load_balancer::{LoadBalancer, LoadBalancerError, LoadBalancerFactory};

/// Map of route name -> load balancer. Immutable after construction.
#[derive(Debug, Default)]
pub struct BalancerPool {
    balancers: BTreeMap<String, Arc<dyn LoadBalancer>>,
}

impl BalancerPool {
    /// Build balancers for every route; the first failure aborts.
    pub fn build(
        routes: &[RouteConfig],
        provider: &ServiceProviderConfig,
        factory: &dyn LoadBalancerFactory,
    ) -> Result<Self, LoadBalancerError> {
        let mut balancers = BTreeMap::new();
        for route in routes {
            let balancer = factory.get(route, provider)?;
            balancers.insert(route.name.clone(), balancer);
        }
        Ok(Self { balancers })
    }

    /// Load balancer for the given route.
    pub fn get(&self, route_name: &str) -> Option<Arc<dyn LoadBalancer>> {
        let balancer = self.balancers.get(route_name).cloned();
        if balancer.is_none() {
            tracing::debug!(route = %route_name, "Route not found in balancer pool");
        }
        balancer
    }

    /// All balancers ordered by route name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn LoadBalancer>)> {
        self.balancers.iter().map(|(name, lb)| (name.as_str(), lb))
    }
}
