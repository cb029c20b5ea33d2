use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{normalize_path, record_request};

/// Outermost layer of the pipeline: tracks in-flight request count, records
/// latency/count metrics, attaches `X-Response-Time`, and logs a one-line
/// summary per request.
pub async fn timing_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| normalize_path(request.uri().path()));

    metrics::gauge!("api_gateway_active_connections").increment(1.0);
    let start = Instant::now();
    let mut response = next.run(request).await;
    let elapsed = start.elapsed();
    metrics::gauge!("api_gateway_active_connections").decrement(1.0);

    let status = response.status().as_u16();
    record_request(method.as_str(), &path, status, elapsed.as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&format!("{:.3}s", elapsed.as_secs_f64())) {
        response.headers_mut().insert("x-response-time", value);
    }

    tracing::info!(
        method = %method,
        path = %path,
        status,
        duration_ms = elapsed.as_millis() as u64,
        "request completed"
    );

    response
}
