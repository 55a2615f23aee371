//! Cognito-specific error handling.

use serde::Deserialize;

use chronocap_core::Error;

/// Error body returned by the Cognito JSON API.
#[derive(Debug, Deserialize)]
pub struct CognitoErrorBody {
    #[serde(rename = "__type", default)]
    pub error_type: String,
    #[serde(alias = "Message", default)]
    pub message: Option<String>,
}

/// Cognito error codes the API distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CognitoErrorCode {
    NotAuthorized,
    UserNotFound,
    UsernameExists,
    UserNotConfirmed,
    InvalidRequest,
    TooManyRequests,
    Unknown,
}

impl CognitoErrorCode {
    /// Classify an error `__type`, ignoring any `namespace#` prefix.
    pub fn from_type(error_type: &str) -> Self {
        let name = error_type.rsplit('#').next().unwrap_or(error_type);
        match name {
            "NotAuthorizedException" => Self::NotAuthorized,
            "UserNotFoundException" => Self::UserNotFound,
            "UsernameExistsException" | "AliasExistsException" => Self::UsernameExists,
            "UserNotConfirmedException" => Self::UserNotConfirmed,
            "CodeMismatchException"
            | "ExpiredCodeException"
            | "InvalidPasswordException"
            | "InvalidParameterException" => Self::InvalidRequest,
            "LimitExceededException" | "TooManyRequestsException" | "TooManyFailedAttemptsException" => {
                Self::TooManyRequests
            }
            _ => Self::Unknown,
        }
    }

    /// HTTP status forwarded to clients.
    pub fn status(&self, response_status: u16) -> u16 {
        match self {
            Self::NotAuthorized => 401,
            Self::UserNotFound => 404,
            Self::UsernameExists => 409,
            Self::UserNotConfirmed => 403,
            Self::InvalidRequest => 400,
            Self::TooManyRequests => 429,
            Self::Unknown => response_status,
        }
    }
}

/// Convert a failed Cognito response into a chronocap `Error`.
pub fn to_chronocap_error(response_status: u16, body: &str) -> Error {
    match serde_json::from_str::<CognitoErrorBody>(body) {
        Ok(parsed) => {
            let code = CognitoErrorCode::from_type(&parsed.error_type);
            let message = parsed
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| parsed.error_type.clone());
            Error::upstream(code.status(response_status), message)
        }
        Err(_) => Error::upstream(
            response_status,
            format!("Identity provider returned status {}", response_status),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_from_plain_type() {
        assert_eq!(
            CognitoErrorCode::from_type("NotAuthorizedException"),
            CognitoErrorCode::NotAuthorized
        );
    }

    #[test]
    fn test_code_from_prefixed_type() {
        assert_eq!(
            CognitoErrorCode::from_type(
                "com.amazonaws.cognito.identity.idp.model#UsernameExistsException"
            ),
            CognitoErrorCode::UsernameExists
        );
    }

    #[test]
    fn test_unknown_keeps_response_status() {
        let code = CognitoErrorCode::from_type("InternalErrorException");
        assert_eq!(code, CognitoErrorCode::Unknown);
        assert_eq!(code.status(500), 500);
    }

    #[test]
    fn test_to_error_forwards_status_and_message() {
        let err = to_chronocap_error(
            400,
            r#"{"__type":"NotAuthorizedException","message":"Incorrect username or password."}"#,
        );
        match err {
            Error::Upstream { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect username or password.");
            }
            other => panic!("Expected Upstream error, got {:?}", other),
        }
    }

    #[test]
    fn test_to_error_reads_capitalized_message() {
        let err = to_chronocap_error(
            400,
            r#"{"__type":"CodeMismatchException","Message":"Invalid code"}"#,
        );
        assert_eq!(err.to_string(), "Invalid code");
    }

    #[test]
    fn test_to_error_with_unparseable_body() {
        let err = to_chronocap_error(502, "<html>bad gateway</html>");
        match err {
            Error::Upstream { status, .. } => assert_eq!(status, 502),
            other => panic!("Expected Upstream error, got {:?}", other),
        }
    }
}
