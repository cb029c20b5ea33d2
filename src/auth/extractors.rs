use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};

use super::verifier::{AuthError, Principal};
use crate::AppState;

fn header_str(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Resolves the request's [`Principal`], preferring the one the pipeline's
/// optional-auth stage already attached to the request extensions and
/// falling back to verifying the header directly (e.g. in tests that
/// exercise a handler without running the full middleware stack).
fn resolve(parts: &Parts, state: &AppState) -> Result<Principal, AuthError> {
    if let Some(principal) = parts.extensions.get::<Principal>() {
        return Ok(principal.clone());
    }
    state.token_verifier.verify(header_str(parts))
}

/// Requires a valid, unexpired bearer token. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct RequireUser(pub Principal);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state).map(RequireUser)
    }
}

/// Requires a valid bearer token whose principal carries the `admin` role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Principal);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = resolve(parts, state)?;
        if !principal.is_admin() {
            return Err(AuthError::Forbidden);
        }
        Ok(RequireAdmin(principal))
    }
}

/// Best-effort principal. Never rejects: absent or invalid credentials
/// simply resolve to `None`, letting handlers branch on identity without
/// forcing authentication.
#[derive(Debug, Clone)]
pub struct OptionalPrincipal(pub Option<Principal>);

impl FromRequestParts<AppState> for OptionalPrincipal {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalPrincipal(resolve(parts, state).ok()))
    }
}
