// Centralized error handling for the gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Failure envelope returned for rejected logins and API errors.
#[derive(Debug, Serialize, serde::Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error_code: String,
    pub message: String,
}

/// Outcomes of the login authenticator.
///
/// The error code strings are a stable contract with clients; they must
/// not change. Every login outcome, including failures, is answered with
/// HTTP 200 and the envelope; clients branch on `error_code`, not on the
/// status line.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email is required.")]
    EmailRequired,

    #[error("Password is required.")]
    PasswordRequired,

    #[error("User not found. Please check your email.")]
    UserNotFound,

    #[error("Account has been deactivated. Please contact support.")]
    AccountDeactivated,

    #[error("Invalid password.")]
    InvalidPassword,

    #[error("Hardware ID does not match. Please log in from the registered device.")]
    HwidMismatch,

    #[error("Internal server error. Please try again later.")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    /// Stable identifier for client-side branching
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::EmailRequired => "EMAIL_REQUIRED",
            AuthError::PasswordRequired => "PASSWORD_REQUIRED",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            AuthError::InvalidPassword => "INVALID_PASSWORD",
            AuthError::HwidMismatch => "HWID_MISMATCH",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Infrastructure failures keep their detail in the server log only;
        // the client sees the generic message.
        if let AuthError::Internal(ref source) = self {
            error!(error = ?source, "Login failed with internal error");
        }

        (
            StatusCode::OK,
            Json(FailureResponse {
                success: false,
                error_code: self.code().to_string(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Errors for the bearer-authenticated API surface.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Too many login attempts. Please wait a minute and try again.")]
    RateLimited,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::UserNotFound => "USER_NOT_FOUND",
            ApiError::InvalidParameter(_) => "INVALID_PARAMETER",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::RateLimited => "RATE_LIMITED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::UserNotFound => StatusCode::UNAUTHORIZED,
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let ApiError::Internal(ref source) = self {
            error!(error = ?source, "Request failed with internal error");
        }

        (
            status,
            Json(FailureResponse {
                success: false,
                error_code: self.code().to_string(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_codes_are_stable() {
        assert_eq!(AuthError::EmailRequired.code(), "EMAIL_REQUIRED");
        assert_eq!(AuthError::PasswordRequired.code(), "PASSWORD_REQUIRED");
        assert_eq!(AuthError::UserNotFound.code(), "USER_NOT_FOUND");
        assert_eq!(AuthError::AccountDeactivated.code(), "ACCOUNT_DEACTIVATED");
        assert_eq!(AuthError::InvalidPassword.code(), "INVALID_PASSWORD");
        assert_eq!(AuthError::HwidMismatch.code(), "HWID_MISMATCH");
        assert_eq!(
            AuthError::Internal(anyhow::anyhow!("db down")).code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_auth_error_responds_with_200() {
        let response = AuthError::HwidMismatch.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_internal_error_message_hides_detail() {
        let err = AuthError::Internal(anyhow::anyhow!("connection refused to db host"));
        let message = err.to_string();
        assert!(!message.contains("connection refused"));
    }

    #[test]
    fn test_api_error_statuses() {
        assert_eq!(
            ApiError::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::RateLimited.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::NotFound("proxy".to_string()).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
