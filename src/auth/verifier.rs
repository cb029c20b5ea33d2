use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The identity extracted from a verified bearer credential. Read-only,
/// scoped to one request.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub subject: String,
    pub email: Option<String>,
    pub role: String,
    pub exp: i64,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
    #[serde(default = "default_role")]
    role: String,
    exp: i64,
}

fn default_role() -> String {
    "user".to_string()
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed authorization header")]
    MalformedAuth,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    ExpiredToken,

    #[error("admin privileges required")]
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let mut response = match &self {
            AuthError::MalformedAuth => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "detail": "Invalid authorization header format" })),
            )
                .into_response(),
            AuthError::InvalidToken(msg) => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "detail": format!("Invalid token: {msg}") })),
            )
                .into_response(),
            AuthError::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "detail": "Token has expired" })),
            )
                .into_response(),
            AuthError::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({ "detail": "Admin privileges required" })),
            )
                .into_response(),
        };

        if matches!(
            self,
            AuthError::MalformedAuth | AuthError::InvalidToken(_) | AuthError::ExpiredToken
        ) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}

/// Decodes and validates bearer credentials into a [`Principal`].
///
/// Two consumers rely on the same verification logic but react to failure
/// differently: the pipeline's optional-auth stage swallows every
/// [`AuthError`] and leaves the request unauthenticated, while the
/// route-level guards (`RequireUser`/`RequireAdmin`) turn it into a hard
/// 401/403 rejection.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret_key: &str, algorithm: &str) -> Self {
        let algorithm = parse_algorithm(algorithm);
        Self {
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            validation: Validation::new(algorithm),
        }
    }

    /// Verify a raw `Authorization` header value, expecting a `Bearer <jwt>` scheme.
    pub fn verify(&self, auth_header: Option<&str>) -> Result<Principal, AuthError> {
        let header_value = auth_header.ok_or(AuthError::MalformedAuth)?;

        let token = header_value
            .get(..7)
            .filter(|prefix| prefix.eq_ignore_ascii_case("bearer "))
            .map(|_| header_value[7..].trim())
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MalformedAuth)?;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                other => AuthError::InvalidToken(other.to_string()),
            })?;

        Ok(Principal {
            subject: data.claims.sub,
            email: data.claims.email,
            role: data.claims.role,
            exp: data.claims.exp,
        })
    }
}

fn parse_algorithm(name: &str) -> Algorithm {
    match name.to_uppercase().as_str() {
        "HS384" => Algorithm::HS384,
        "HS512" => Algorithm::HS512,
        _ => Algorithm::HS256,
    }
}
