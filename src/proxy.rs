//! Forwards proxied requests to backend services over a pooled
//! [`reqwest::Client`], translating backend failures into the gateway's own
//! synthetic error responses.
//!
//! Same header stripping/injection on every hop, and a three-way
//! timeout/connect/other failure mapping to 504/503/502.

use axum::{
    body::Bytes,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Request headers that must never be relayed verbatim between hops.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("backend timed out")]
    Timeout,
    #[error("backend unreachable")]
    ConnectFailed,
    #[error("backend request failed: {0}")]
    Other(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ProxyError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "Service timeout"),
            ProxyError::ConnectFailed => (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable"),
            ProxyError::Other(_) => (StatusCode::BAD_GATEWAY, "Internal gateway error"),
        };
        if let ProxyError::Other(msg) = &self {
            tracing::error!(error = %msg, "proxy request failed");
        }
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProxyError::Timeout
        } else if err.is_connect() {
            ProxyError::ConnectFailed
        } else {
            ProxyError::Other(err.to_string())
        }
    }
}

/// Everything needed to forward one request to one backend.
pub struct ForwardRequest<'a> {
    pub client: &'a reqwest::Client,
    pub method: Method,
    pub target_url: String,
    pub headers: &'a HeaderMap,
    pub body: Bytes,
    pub client_ip: String,
    pub forwarded_host: Option<String>,
    pub scheme: &'a str,
    pub correlation_id: &'a str,
}

/// Forward a request and translate the backend's response (or failure)
/// into an axum [`Response`].
pub async fn forward(req: ForwardRequest<'_>) -> Result<Response, ProxyError> {
    let method = reqwest::Method::from_bytes(req.method.as_str().as_bytes())
        .map_err(|e| ProxyError::Other(e.to_string()))?;

    let mut outbound_headers = reqwest::header::HeaderMap::new();
    for (name, value) in req.headers.iter() {
        if HOP_BY_HOP.contains(&name.as_str().to_ascii_lowercase().as_str()) {
            continue;
        }
        if let Ok(name) = reqwest::header::HeaderName::from_bytes(name.as_str().as_bytes()) {
            outbound_headers.insert(name, value.as_bytes().try_into().unwrap());
        }
    }
    outbound_headers.insert(
        "x-forwarded-for",
        req.client_ip.parse().unwrap_or_else(|_| "unknown".parse().unwrap()),
    );
    outbound_headers.insert(
        "x-forwarded-host",
        req.forwarded_host
            .as_deref()
            .unwrap_or("")
            .parse()
            .unwrap_or_else(|_| "".parse().unwrap()),
    );
    outbound_headers.insert("x-forwarded-proto", req.scheme.parse().unwrap());
    outbound_headers.insert("x-correlation-id", req.correlation_id.parse().unwrap());

    let upstream = req
        .client
        .request(method, &req.target_url)
        .headers(outbound_headers)
        .body(req.body)
        .send()
        .await?;

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let response_headers = upstream.headers().clone();
    let body = upstream.bytes().await?;

    let mut response = Response::builder().status(status);
    if let Some(headers) = response.headers_mut() {
        for (name, value) in response_headers.iter() {
            let lower = name.as_str().to_ascii_lowercase();
            if HOP_BY_HOP.contains(&lower.as_str()) {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_str().as_bytes()),
                HeaderValue::from_bytes(value.as_bytes()),
            ) {
                headers.insert(name, value);
            }
        }
    }

    Ok(response
        .body(axum::body::Body::from(body))
        .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response()))
}
