//! Catch-all handler that forwards any request matching a registered
//! service prefix to its backend. Mounted last so gateway-local routes
//! (composite endpoints, `/api/v1/gateway/*`) take precedence.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;

use crate::{
    metrics::record_proxy_request,
    middleware::CorrelationId,
    proxy::{forward, ForwardRequest},
    AppState,
};

/// Upper bound on a proxied request body. Not in spec.md; a concrete cap a
/// production proxy needs that the spec left unstated.
const MAX_PROXY_BODY_BYTES: usize = 10 * 1024 * 1024;

pub async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let path = request.uri().path().to_string();

    let Some((service, base_url)) = state.registry.resolve(&path) else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "detail": "Not found" })),
        )
            .into_response();
    };

    let mut target_url = format!("{base_url}{path}");
    if let Some(query) = request.uri().query() {
        target_url.push('?');
        target_url.push_str(query);
    }

    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .map(|c| c.0.clone())
        .unwrap_or_default();
    let forwarded_host = request
        .headers()
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string());
    // TLS termination happens upstream of this gateway; a terminating load
    // balancer is expected to set its own X-Forwarded-Proto, which we
    // relay through rather than overwrite.
    let scheme = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http")
        .to_string();

    let method = request.method().clone();
    let headers = request.headers().clone();
    let timeout = state.settings.proxy.timeout;

    let body = match axum::body::to_bytes(request.into_body(), MAX_PROXY_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => Bytes::new(),
    };

    let start = Instant::now();
    let forward_request = ForwardRequest {
        client: &state.http_client,
        method,
        target_url,
        headers: &headers,
        body,
        client_ip,
        forwarded_host,
        scheme: &scheme,
        correlation_id: &correlation_id,
    };

    let outcome = tokio::time::timeout(timeout, forward(forward_request)).await;

    let (response, status) = match outcome {
        Ok(Ok(response)) => {
            let status = response.status().as_u16();
            (response, status)
        }
        Ok(Err(proxy_err)) => {
            let response = proxy_err.into_response();
            let status = response.status().as_u16();
            (response, status)
        }
        Err(_) => {
            let response = crate::proxy::ProxyError::Timeout.into_response();
            (response, StatusCode::GATEWAY_TIMEOUT.as_u16())
        }
    };

    record_proxy_request(service.as_str(), status, start.elapsed().as_secs_f64());
    response
}
