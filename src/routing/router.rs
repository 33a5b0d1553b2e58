//! Route lookup.
//!
//! # Responsibilities
//! - Store the configured routes
//! - Find the route owning a request path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Longest prefix wins; ties keep configuration order
//! - O(n) scan, fine for typical route counts

use crate::config::RouteConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// A route resolved for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute<'a> {
    pub name: &'a str,
    pub prefix: &'a str,
    pub authenticated: bool,
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    name: String,
    matcher: PathPrefixMatcher,
    authenticated: bool,
}

/// Routing table built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    pub fn new(routes: &[RouteConfig]) -> Self {
        let mut compiled: Vec<CompiledRoute> = routes
            .iter()
            .map(|r| CompiledRoute {
                name: r.name.clone(),
                matcher: PathPrefixMatcher::new(r.path_prefix.as_str()),
                authenticated: r.authenticated,
            })
            .collect();
        // stable sort keeps configuration order among equal lengths
        compiled.sort_by(|a, b| b.matcher.prefix().len().cmp(&a.matcher.prefix().len()));
        Self { routes: compiled }
    }

    pub fn match_path(&self, path: &str) -> Option<MatchedRoute<'_>> {
        self.routes
            .iter()
            .find(|r| r.matcher.matches(path))
            .map(|r| MatchedRoute {
                name: &r.name,
                prefix: r.matcher.prefix(),
                authenticated: r.authenticated,
            })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
