use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{
    middleware::{correlation_middleware, optional_auth_middleware, rate_limit_middleware, timing_middleware},
    AppState,
};

pub mod gateway;
pub mod misc;
pub mod proxy;

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT];

    if allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| {
                origin.parse::<HeaderValue>().ok().or_else(|| {
                    tracing::warn!(origin, "invalid CORS origin, skipping");
                    None
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true)
    }
}

/// Assembles the full gateway router: local routes, the proxy fallback,
/// and the middleware pipeline.
///
/// A `Router::layer()` call wraps everything added so far, so the *last*
/// call ends up outermost — the first layer a request meets and the last
/// one its response passes back through. To get the desired order (CORS,
/// then correlation, then auth, then rate-limit, then routing, with
/// timing wrapping the whole thing) the calls below run from innermost
/// (rate-limit, right next to the router) to outermost (timing), so CORS
/// preflights are turned away before they ever reach the auth or
/// rate-limit stages.
pub fn build_router(state: AppState) -> Router {
    let local_routes = Router::new()
        .route("/", get(misc::root))
        .route("/api", get(misc::api_info))
        .route("/health", get(misc::health_check))
        .route("/health/ready", get(misc::health_ready))
        .route("/docs", get(misc::docs))
        .route("/openapi.json", get(misc::openapi_json))
        .route("/metrics", get(misc::metrics_endpoint))
        .route("/api/v1/gateway/services", get(gateway::list_services))
        .route("/api/v1/gateway/health", get(gateway::check_services_health))
        .route("/api/v1/gateway/user", get(gateway::get_current_user))
        .route("/api/v1/home", get(gateway::get_home_data))
        .route("/api/v1/dashboard", get(gateway::get_dashboard_data))
        .route("/api/v1/admin/overview", get(gateway::get_admin_overview));

    let cors = cors_layer(&state.settings.cors.allowed_origins);

    local_routes
        .fallback(proxy::dispatch)
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(from_fn_with_state(state.clone(), optional_auth_middleware))
        .layer(from_fn(correlation_middleware))
        .layer(cors)
        .layer(from_fn(timing_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
