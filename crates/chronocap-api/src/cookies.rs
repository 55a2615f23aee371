//! Session cookies set by login and refresh.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};

use chronocap_core::defaults::{REFRESH_COOKIE_MAX_AGE_SECS, SESSION_COOKIE_MAX_AGE_SECS};
use chronocap_core::AuthSession;

pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const SESSION_ID_COOKIE: &str = "sessionId";

/// One `HttpOnly; SameSite=Strict` cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCookie {
    pub name: &'static str,
    pub value: String,
    pub max_age_seconds: i64,
    pub secure: bool,
}

impl SessionCookie {
    pub fn new(name: &'static str, value: String, max_age_seconds: i64, secure: bool) -> Self {
        Self {
            name,
            value,
            max_age_seconds,
            secure,
        }
    }

    /// Expire the cookie immediately.
    pub fn clear(name: &'static str, secure: bool) -> Self {
        Self::new(name, String::new(), 0, secure)
    }

    pub fn to_header_value(&self) -> String {
        let mut parts = vec![
            format!("{}={}", self.name, self.value),
            "Path=/".to_string(),
            format!("Max-Age={}", self.max_age_seconds),
            "HttpOnly".to_string(),
        ];
        if self.secure {
            parts.push("Secure".to_string());
        }
        parts.push("SameSite=Strict".to_string());
        parts.join("; ")
    }
}

/// Cookies carrying a freshly issued session.
///
/// Refresh responses carry no new refresh token, so the existing refresh
/// cookie is left alone in that case.
pub fn session_cookies(session: &AuthSession, secure: bool) -> Vec<SessionCookie> {
    let mut cookies = Vec::with_capacity(3);
    if let Some(refresh) = &session.refresh_token {
        cookies.push(SessionCookie::new(
            REFRESH_TOKEN_COOKIE,
            refresh.clone(),
            REFRESH_COOKIE_MAX_AGE_SECS,
            secure,
        ));
    }
    cookies.push(SessionCookie::new(
        ACCESS_TOKEN_COOKIE,
        session.access_token.clone(),
        SESSION_COOKIE_MAX_AGE_SECS,
        secure,
    ));
    cookies.push(SessionCookie::new(
        SESSION_ID_COOKIE,
        session.id_token.clone(),
        SESSION_COOKIE_MAX_AGE_SECS,
        secure,
    ));
    cookies
}

/// Cookies that remove every session cookie.
pub fn cleared_cookies(secure: bool) -> Vec<SessionCookie> {
    [REFRESH_TOKEN_COOKIE, ACCESS_TOKEN_COOKIE, SESSION_ID_COOKIE]
        .into_iter()
        .map(|name| SessionCookie::clear(name, secure))
        .collect()
}

/// `Set-Cookie` headers for a response.
pub fn set_cookie_headers(cookies: &[SessionCookie]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_header_value()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => {
                tracing::warn!(cookie = cookie.name, error = %e, "Skipping unencodable cookie");
            }
        }
    }
    headers
}

/// Value of a named cookie from the request `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .map(str::trim)
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| value.to_string())
        })
        .filter(|v| !v.is_empty())
}
