use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use common::types::ErrorBody;
use service::identity::IdentityError;
use service::oauth::OAuthError;

/// Code reported for upstream identity provider failures.
pub const OAUTH_ERROR_CODE: u16 = 1300;
/// Code reported when a session token cannot be issued.
pub const SESSION_ERROR_CODE: u16 = 1500;
/// Code reported for malformed requests rejected before any service call.
pub const BAD_REQUEST_CODE: u16 = 1400;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: u16,
}

impl ApiError {
    pub fn new(status: StatusCode, code: u16, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), code }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, BAD_REQUEST_CODE, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, IdentityError::Unauthorized.code(), message)
    }

    /// Denied OAuth login. The cause keeps its code but never its message.
    pub fn login_denied(cause: &IdentityError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, cause.code(), "login denied")
    }
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        let status = match &e {
            IdentityError::MissingEmail | IdentityError::Unauthorized => StatusCode::UNAUTHORIZED,
            IdentityError::Validation(_) => StatusCode::BAD_REQUEST,
            IdentityError::Conflict(_) | IdentityError::UsernameExhausted { .. } => StatusCode::CONFLICT,
            IdentityError::NotFound => StatusCode::NOT_FOUND,
            IdentityError::HashError(_) | IdentityError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // internals stay in the log
        let message = if status.is_server_error() {
            error!(code = e.code(), error = %e, "identity operation failed");
            "internal error".to_string()
        } else {
            e.to_string()
        };
        Self { status, message, code: e.code() }
    }
}

impl From<OAuthError> for ApiError {
    fn from(e: OAuthError) -> Self {
        error!(error = %e, "identity provider call failed");
        Self::new(StatusCode::BAD_GATEWAY, OAUTH_ERROR_CODE, "identity provider unavailable")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message, code: self.code })).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_errors_map_to_statuses() {
        let cases = [
            (IdentityError::MissingEmail, StatusCode::UNAUTHORIZED),
            (IdentityError::Validation("short".into()), StatusCode::BAD_REQUEST),
            (IdentityError::Conflict("dup".into()), StatusCode::CONFLICT),
            (IdentityError::UsernameExhausted { base: "a".into(), attempts: 3 }, StatusCode::CONFLICT),
            (IdentityError::NotFound, StatusCode::NOT_FOUND),
            (IdentityError::Unauthorized, StatusCode::UNAUTHORIZED),
            (IdentityError::Repository("db down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let code = err.code();
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.code, code);
        }
    }

    #[test]
    fn server_errors_hide_details() {
        let api = ApiError::from(IdentityError::Repository("password=hunter2".into()));
        assert_eq!(api.message, "internal error");
    }

    #[test]
    fn provider_errors_are_bad_gateway() {
        let api = ApiError::from(OAuthError::Provider("invalid_grant".into()));
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api.code, OAUTH_ERROR_CODE);
    }
}
