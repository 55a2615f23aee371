//! HTTP error envelope.
//!
//! Every failure leaves the server as
//! `{ "status": 404, "message": "...", "error": "...", "data": { "message": "..." } }`.

use std::any::Any;

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Message used for failures whose details stay in the logs.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// Failure reported by an upstream service, forwarded with its status.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },
    /// Anything unexpected. The detail is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => GENERIC_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<chronocap_core::Error> for ApiError {
    fn from(err: chronocap_core::Error) -> Self {
        use chronocap_core::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Upstream { status, message } => ApiError::Upstream {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                message,
            },
            Error::Request(msg) => ApiError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: msg,
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorData {
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    status: u16,
    message: String,
    error: String,
    data: ErrorData,
}

fn envelope(status: StatusCode, message: String) -> Response {
    let body = ErrorEnvelope {
        status: status.as_u16(),
        error: message.clone(),
        data: ErrorData {
            message: message.clone(),
        },
        message,
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(
                subsystem = "api",
                status = status.as_u16(),
                error = %self,
                "Request failed"
            );
        } else {
            tracing::debug!(subsystem = "api", status = status.as_u16(), error = %self, "Request rejected");
        }
        envelope(status, self.public_message())
    }
}

/// Render a handler panic as a 500 envelope.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(subsystem = "api", panic = %detail, "Handler panicked");
    envelope(
        StatusCode::INTERNAL_SERVER_ERROR,
        GENERIC_ERROR_MESSAGE.to_string(),
    )
}

/// JSON body extractor whose rejections use the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronocap_core::Error;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_envelope() {
        let response = ApiError::from(Error::NotFound("Capsule not found".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["status"], 404);
        assert_eq!(body["message"], "Capsule not found");
        assert_eq!(body["error"], "Capsule not found");
        assert_eq!(body["data"]["message"], "Capsule not found");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let err = Error::Internal("pool exhausted at 10.0.0.5".into());
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_upstream_status_is_forwarded() {
        let err = ApiError::from(Error::upstream(409, "User already exists"));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "User already exists");
    }

    #[test]
    fn test_invalid_upstream_status_becomes_bad_gateway() {
        let err = ApiError::from(Error::upstream(42, "weird"));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err = ApiError::from(Error::InvalidInput("userId is required".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_panic_response() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["status"], 500);
    }
}
