use axum::{extract::Request, extract::State, middleware::Next, response::Response};

use crate::{metrics::record_auth_attempt, AppState};

/// Routes that never attempt authentication at all. Longest-prefix
/// semantics aren't needed here: these are bypass checks, not routing
/// decisions, so a plain `starts_with` over every entry is sufficient.
pub const PUBLIC_PREFIXES: &[&str] = &[
    "/health",
    "/metrics",
    "/docs",
    "/openapi.json",
    "/api/v1/auth/login",
    "/api/v1/auth/register",
    "/api/v1/auth/refresh",
    "/api/v1/radio/stations",
    "/api/v1/concerts",
    "/api/v1/search",
];

pub fn is_public_route(path: &str) -> bool {
    PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Best-effort authentication stage, run for every request ahead of
/// routing. Attempts to verify an `Authorization` header and, on success,
/// attaches the resulting [`Principal`] to the request extensions so
/// downstream extractors (`RequireUser`, `RequireAdmin`,
/// `OptionalPrincipal`) don't need to re-parse the header.
///
/// Failures here are never fatal, they just leave the request
/// unauthenticated. Routes
/// that require auth enforce it themselves via the `RequireUser`/
/// `RequireAdmin` extractors. Public routes skip the verification attempt
/// entirely, so e.g. a stray `Authorization` header on `/health` never
/// shows up in the auth-attempt metrics.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_public_route(request.uri().path()) {
        return next.run(request).await;
    }

    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match state.token_verifier.verify(header) {
        Ok(principal) => {
            record_auth_attempt("success");
            request.extensions_mut().insert(principal);
        }
        Err(_) if header.is_some() => {
            record_auth_attempt("failure");
        }
        Err(_) => {}
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_prefixes_match_health_and_docs() {
        assert!(is_public_route("/health"));
        assert!(is_public_route("/health/ready"));
        assert!(is_public_route("/docs"));
        assert!(is_public_route("/api/v1/auth/login"));
    }

    #[test]
    fn protected_prefixes_are_not_public() {
        assert!(!is_public_route("/api/v1/admin/overview"));
        assert!(!is_public_route("/api/v1/dashboard"));
    }
}
