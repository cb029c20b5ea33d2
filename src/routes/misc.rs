//! Root/info/docs endpoints and the liveness and Prometheus surfaces.
//!
//! Small, mostly-static responses describing the gateway itself rather
//! than any backend.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

pub async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "api-gateway",
        "version": state.settings.observability.app_version,
        "docs": "/docs",
        "health": "/health",
    }))
}

pub async fn api_info() -> Json<serde_json::Value> {
    Json(json!({
        "version": "v1",
        "base_url": "/api/v1",
        "endpoints": {
            "home": "/api/v1/home",
            "dashboard": "/api/v1/dashboard",
            "admin_overview": "/api/v1/admin/overview",
            "gateway_services": "/api/v1/gateway/services",
            "gateway_health": "/api/v1/gateway/health",
            "gateway_user": "/api/v1/gateway/user",
        },
    }))
}

/// Liveness probe. Deliberately cheap: no backend calls, so container
/// orchestrators can poll it often without generating load.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": state.settings.observability.app_version,
    }))
}

/// Readiness probe. Unlike `/health`, orchestrators treat a non-200 here as
/// "don't send traffic yet" rather than "restart the container" — kept
/// equally cheap since the gateway has no startup-time dependency warmup
/// to gate on (backends are resolved lazily per request).
pub async fn health_ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ready",
        "version": state.settings.observability.app_version,
    }))
}

pub async fn docs() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/html; charset=utf-8")],
        "<html><body><h1>API Gateway</h1><p>See /openapi.json for the machine-readable spec.</p></body></html>",
    )
}

/// Minimal static OpenAPI stub. A full generator is out of scope; this is
/// enough for tooling that only needs the document to exist.
pub async fn openapi_json(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "openapi": "3.0.0",
        "info": {
            "title": "CloudSound API Gateway",
            "version": state.settings.observability.app_version,
        },
        "paths": {},
    }))
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics_handle {
        Some(handle) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            handle.render(),
        )
            .into_response(),
        None => {
            (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response()
        }
    }
}
