use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Serialize)]
struct DetailBody {
    detail: String,
}

fn detail_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, Json(DetailBody { detail: detail.into() })).into_response()
}

/// Crate-wide catch-all error.
///
/// Component-specific failures (auth, proxying) carry their own
/// [`thiserror`] enums with their own [`IntoResponse`] impls — see
/// [`crate::auth::AuthError`] and [`crate::proxy::ProxyError`]. This type is
/// for configuration/bootstrap failures and anything else that has no more
/// specific home.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal gateway error")]
    Internal,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::Config(msg) => {
                tracing::error!("configuration error: {msg}");
                detail_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal gateway error")
            }
            GatewayError::Internal => {
                detail_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal gateway error")
            }
        }
    }
}
