//! Maps request paths onto backend service base URLs.
//!
//! Resolves by longest matching prefix rather than declaration order, so
//! overlapping prefixes (`/api/v1/radio` and a hypothetical
//! `/api/v1/radio/admin`) always route to the more specific match
//! regardless of how the backends were registered.

use crate::config::BackendConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceName {
    Radio,
    Concerts,
    Auth,
    Analytics,
    Discovery,
    Events,
    Admin,
}

impl ServiceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Radio => "radio",
            ServiceName::Concerts => "concerts",
            ServiceName::Auth => "auth",
            ServiceName::Analytics => "analytics",
            ServiceName::Discovery => "discovery",
            ServiceName::Events => "events",
            ServiceName::Admin => "admin",
        }
    }
}

struct Route {
    prefix: &'static str,
    service: ServiceName,
}

/// Routes requests to backend services by URL prefix.
pub struct ServiceRegistry {
    backends: BackendConfig,
    routes: Vec<Route>,
}

impl ServiceRegistry {
    pub fn new(backends: BackendConfig) -> Self {
        let routes = vec![
            Route { prefix: "/api/v1/radio", service: ServiceName::Radio },
            Route { prefix: "/api/v1/stream", service: ServiceName::Radio },
            Route { prefix: "/api/v1/search", service: ServiceName::Radio },
            Route { prefix: "/api/v1/concerts", service: ServiceName::Concerts },
            Route { prefix: "/api/v1/auth", service: ServiceName::Auth },
            Route { prefix: "/api/v1/analytics", service: ServiceName::Analytics },
            Route { prefix: "/api/v1/discover", service: ServiceName::Discovery },
            Route { prefix: "/api/v1/events", service: ServiceName::Events },
            Route { prefix: "/api/v1/admin", service: ServiceName::Admin },
        ];
        Self { backends, routes }
    }

    /// The service's configured base URL.
    pub fn base_url(&self, service: ServiceName) -> &str {
        match service {
            ServiceName::Radio => &self.backends.radio,
            ServiceName::Concerts => &self.backends.concerts,
            ServiceName::Auth => &self.backends.auth,
            ServiceName::Analytics => &self.backends.analytics,
            ServiceName::Discovery => &self.backends.discovery,
            ServiceName::Events => &self.backends.events,
            ServiceName::Admin => &self.backends.admin,
        }
    }

    /// Resolve a request path to its backend's base URL, picking the
    /// longest matching registered prefix. Returns `None` for paths that
    /// aren't proxied (handled by local gateway routes instead).
    pub fn resolve(&self, path: &str) -> Option<(ServiceName, &str)> {
        self.routes
            .iter()
            .filter(|route| path.starts_with(route.prefix))
            .max_by_key(|route| route.prefix.len())
            .map(|route| (route.service, self.base_url(route.service)))
    }

    /// Every distinct service name this registry knows how to route to,
    /// for the `/api/v1/gateway/services` listing.
    pub fn service_names(&self) -> Vec<&'static str> {
        let mut seen = std::collections::HashSet::new();
        let mut names = Vec::new();
        for route in &self.routes {
            if seen.insert(route.service) {
                names.push(route.service.as_str());
            }
        }
        names
    }

    /// `(name, base_url)` pairs for every distinct service, for health
    /// rollups and the services listing.
    pub fn all_services(&self) -> Vec<(&'static str, &str)> {
        let mut seen = std::collections::HashSet::new();
        let mut services = Vec::new();
        for route in &self.routes {
            if seen.insert(route.service) {
                services.push((route.service.as_str(), self.base_url(route.service)));
            }
        }
        services
    }
}
