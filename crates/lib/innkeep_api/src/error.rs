//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use innkeep_core::auth::AuthError;

use crate::dto::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// Every auth failure carries a stable machine-readable code; infrastructure
/// faults collapse into `internal_error` with a generic message so storage
/// state never doubles as a security signal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("principal not found")]
    PrincipalNotFound,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::DuplicateEmail => (
                StatusCode::CONFLICT,
                "duplicate_email",
                "email already registered",
            ),
            // One code for unknown email and wrong password alike.
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "invalid email or password",
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "invalid or expired token",
            ),
            AppError::PrincipalNotFound => (
                StatusCode::UNAUTHORIZED,
                "principal_not_found",
                "principal not found",
            ),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            ),
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::DuplicateEmail => AppError::DuplicateEmail,
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::InvalidToken => AppError::InvalidToken,
            AuthError::PrincipalNotFound => AppError::PrincipalNotFound,
            AuthError::Integrity(msg) => AppError::Internal(msg),
            AuthError::Db(e) => AppError::Internal(e.to_string()),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn auth_failures_map_to_client_statuses() {
        assert_eq!(status_of(AppError::DuplicateEmail), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AppError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AppError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AppError::PrincipalNotFound),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn infrastructure_faults_stay_internal() {
        assert_eq!(
            status_of(AppError::Internal("pool exhausted".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::from(AuthError::Integrity("dual rows".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
