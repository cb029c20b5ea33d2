use std::sync::Arc;

pub mod aggregator;
pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod proxy;
pub mod rate_limit;
pub mod registry;
pub mod routes;

use auth::TokenVerifier;
use config::Settings;
use rate_limit::RateLimiter;
use registry::ServiceRegistry;

/// Shared state handed to every handler and middleware stage.
///
/// `http_client`, like `ServiceRegistry` and `RateLimiter`, is wrapped for
/// cheap `Clone` rather than locked: `reqwest::Client` is internally
/// `Arc`-shared, so no additional synchronization is needed to use it from
/// concurrent tasks.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<ServiceRegistry>,
    pub http_client: reqwest::Client,
    pub rate_limiter: Arc<RateLimiter>,
    pub token_verifier: Arc<TokenVerifier>,
    pub metrics_handle: Option<Arc<metrics_exporter_prometheus::PrometheusHandle>>,
}
