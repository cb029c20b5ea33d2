use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;

use crate::{auth::Principal, metrics::record_rate_limit_hit, rate_limit::client_key, AppState};

/// Routes exempt from rate limiting entirely — operational and discovery
/// endpoints that monitoring and tooling need to hit regardless of
/// traffic volume.
pub const EXEMPT_PREFIXES: &[&str] = &["/health", "/metrics", "/docs", "/openapi.json"];

pub fn is_exempt_route(path: &str) -> bool {
    EXEMPT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Token-bucket rate limiting stage. Runs after the optional-auth stage so
/// authenticated requests are keyed by user id rather than IP, matching
/// `rate_limit::client_key`'s precedence.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    connect_info: ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if is_exempt_route(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = client_ip(&request, &connect_info);
    let subject = request
        .extensions()
        .get::<Principal>()
        .map(|p| p.subject.as_str());
    let client_type = if subject.is_some() { "user" } else { "ip" };
    let key = client_key(subject, ip);

    let info = state.rate_limiter.check(&key);
    record_rate_limit_hit(client_type);

    let limit_header = HeaderValue::from(info.limit);
    let remaining_header = HeaderValue::from(info.remaining);

    if !info.allowed {
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "detail": "Rate limit exceeded. Try again later." })),
        )
            .into_response();
        let headers = response.headers_mut();
        headers.insert("x-ratelimit-limit", limit_header);
        headers.insert("x-ratelimit-remaining", remaining_header);
        if let Ok(value) = HeaderValue::from_str(&info.retry_after_secs.to_string()) {
            headers.insert("x-ratelimit-reset", value.clone());
            headers.insert("retry-after", value);
        }
        return response;
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", limit_header);
    headers.insert("x-ratelimit-remaining", remaining_header);
    response
}

/// Prefer `X-Forwarded-For` (first hop) set by an upstream reverse proxy,
/// falling back to the TCP peer address.
fn client_ip(request: &Request, connect_info: &ConnectInfo<SocketAddr>) -> std::net::IpAddr {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_else(|| connect_info.0.ip())
}
