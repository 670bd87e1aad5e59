//! The immutable route table.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::Handler;
use crate::registry::naming::{derive_route, find_override};

/// A handler unit as compiled into the binary.
#[derive(Clone)]
pub struct Unit {
    pub name: String,
    pub handler: Arc<dyn Handler>,
}

impl Unit {
    pub fn new(name: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            name: name.into(),
            handler: Arc::new(handler),
        }
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A route bound to its handler.
#[derive(Clone)]
pub struct RouteEntry {
    identifier: String,
    route: String,
    handler: Arc<dyn Handler>,
}

impl RouteEntry {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("identifier", &self.identifier)
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

/// All registered routes, keyed by route string.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    routes: BTreeMap<String, Arc<RouteEntry>>,
}

impl Registry {
    /// Bind every unit to its derived or overridden route.
    pub fn from_units(units: Vec<Unit>, overrides: &BTreeMap<String, String>) -> Self {
        let mut registry = Self::default();

        for unit in units {
            let route = find_override(overrides, &unit.name)
                .cloned()
                .unwrap_or_else(|| derive_route(&unit.name));

            let entry = RouteEntry {
                identifier: unit.name,
                route: route.clone(),
                handler: unit.handler,
            };
            if let Some(previous) = registry.routes.insert(route.clone(), Arc::new(entry)) {
                tracing::debug!(
                    route = %route,
                    replaced = %previous.identifier,
                    "Route registered twice, keeping the later unit"
                );
            }
        }

        tracing::info!(routes = registry.routes.len(), "Handler registry built");
        registry
    }

    pub fn lookup(&self, route: &str) -> Option<&Arc<RouteEntry>> {
        self.routes.get(route)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Arc<RouteEntry>> {
        self.routes.values()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
