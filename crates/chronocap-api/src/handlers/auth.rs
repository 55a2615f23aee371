//! `/auth` handlers.
//!
//! Login and refresh answer with the access token in the body and the full
//! session in `HttpOnly` cookies. Refresh takes its token from the
//! `refreshToken` cookie, or from the body for non-browser clients.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use chronocap_core::User;

use crate::auth::bearer_token;
use crate::cookies::{
    cleared_cookies, read_cookie, session_cookies, set_cookie_headers, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
use crate::error::{ApiError, ApiJson};
use crate::services::auth_service::{
    ConfirmEmailRequest, LoginRequest, RefreshRequest, RegisterRequest, ResetConfirmRequest,
    ResetRequest,
};
use crate::services::LoginOutcome;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    access_token: String,
    user: Option<User>,
}

fn session_response(outcome: LoginOutcome, secure: bool) -> impl IntoResponse {
    let headers = set_cookie_headers(&session_cookies(&outcome.session, secure));
    let body = SessionResponse {
        access_token: outcome.session.access_token,
        user: outcome.user,
    };
    (StatusCode::OK, headers, Json(body))
}

fn message(text: &str) -> Json<serde_json::Value> {
    Json(json!({ "message": text }))
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.auth.register(body).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.auth.login(body).await?;
    Ok(session_response(outcome, state.cookie_secure))
}

/// Revoke the session named by the bearer header or the access-token cookie,
/// then clear the cookies.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let from_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| bearer_token(Some(h)).ok())
        .map(str::to_string);
    let token = from_header.or_else(|| read_cookie(&headers, ACCESS_TOKEN_COOKIE));

    state.auth.logout(token.as_deref()).await?;

    let cookies = set_cookie_headers(&cleared_cookies(state.cookie_secure));
    Ok((StatusCode::OK, cookies, message("Logged out successfully!")))
}

pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let token = read_cookie(&headers, REFRESH_TOKEN_COOKIE)
        .or_else(|| body.and_then(|Json(b)| b.refresh_token));
    let outcome = state.auth.refresh(token).await?;
    Ok(session_response(outcome, state.cookie_secure))
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ResetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.request_password_reset(body).await?;
    Ok(message("Password reset email sent"))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ResetConfirmRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.confirm_password_reset(body).await?;
    Ok(message("Password successfully reset"))
}

pub async fn confirm_email(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ConfirmEmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.confirm_email(body).await?;
    Ok(message("Email confirmed successfully!"))
}
