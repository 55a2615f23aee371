//! Bearer-token authentication extractor.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::services::AuthUser;
use crate::state::AppState;

pub const MISSING_HEADER: &str = "Please provide Authorization header";
pub const NOT_BEARER: &str = "Auth header should be of type Bearer";

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, ApiError> {
    let header = header.ok_or_else(|| ApiError::Unauthorized(MISSING_HEADER.to_string()))?;
    match header.split_once(' ') {
        Some(("Bearer", token)) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(ApiError::Unauthorized(NOT_BEARER.to_string())),
    }
}

/// Extractor that requires a valid access token with a local profile.
///
/// Usage:
/// ```ignore
/// async fn handler(RequireAuth(caller): RequireAuth) -> impl IntoResponse {
///     caller.user.id
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Non-UTF-8 header values count as malformed
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|_| ApiError::Unauthorized(NOT_BEARER.to_string()))?,
            ),
            None => None,
        };
        let token = bearer_token(header)?;
        let caller = state.auth.resolve_access_token(token).await?;
        tracing::debug!(subsystem = "api", user_id = %caller.user.id, "Caller authenticated");
        Ok(RequireAuth(caller))
    }
}
