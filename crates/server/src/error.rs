//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before a response is produced, and their details never
//! reach the client. Every error body is `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use refill_core::ScheduleError;

use crate::services::{AuthError, ServiceError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Business operation failed.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not signed in.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Service(err) => match err {
                ServiceError::Repository(_) | ServiceError::PartialWrite { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Validation(_) | ServiceError::Plan(_) => StatusCode::BAD_REQUEST,
                ServiceError::Conflict(_)
                | ServiceError::Transition(_)
                | ServiceError::Ledger(_) => StatusCode::CONFLICT,
                ServiceError::Schedule(schedule) => match schedule {
                    ScheduleError::AlreadyDelivered { .. } | ScheduleError::NothingPending => {
                        StatusCode::CONFLICT
                    }
                    ScheduleError::LengthMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_REQUEST,
                },
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidSession => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::InvalidAddress(_)
                | AuthError::MissingField(_) => StatusCode::BAD_REQUEST,
                AuthError::AccountNotFound => StatusCode::NOT_FOUND,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::SessionExpiry => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message.
    fn message(&self) -> String {
        match self {
            Self::Service(ServiceError::PartialWrite { completed, .. }) => {
                format!("Request only partially completed ({completed})")
            }
            Self::Service(
                ServiceError::Repository(_)
                | ServiceError::Schedule(ScheduleError::LengthMismatch { .. }),
            )
            | Self::Auth(
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::SessionExpiry,
            )
            | Self::Internal(_) => "Internal server error".to_string(),
            Self::Service(err) => err.to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::InvalidSession => "Session expired, please sign in again".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                other => other.to_string(),
            },
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the signed-in caller.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use refill_core::{SaleAction, SaleStatus};

    use super::*;
    use crate::db::RepositoryError;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("sale-123".to_string());
        assert_eq!(err.to_string(), "Not found: sale-123");
    }

    #[test]
    fn test_service_error_status_codes() {
        assert_eq!(
            get_status(ServiceError::validation("invalid referral code")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ServiceError::NotFound("plan")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ServiceError::from(
                SaleStatus::Delivered.apply(SaleAction::Cancel).unwrap_err()
            )),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ServiceError::Schedule(ScheduleError::NothingPending)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ServiceError::Schedule(ScheduleError::IndexOutOfRange {
                index: 9,
                len: 4
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ServiceError::Repository(RepositoryError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AuthError::MissingField("name")),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::from(ServiceError::Repository(RepositoryError::DataCorruption(
            "users/u1: secret detail".to_string(),
        )));
        assert_eq!(err.message(), "Internal server error");

        let partial = AppError::from(ServiceError::PartialWrite {
            completed: "sale s1 recorded".to_string(),
            source: RepositoryError::NotFound,
        });
        assert_eq!(partial.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(partial.message().contains("sale s1 recorded"));
    }
}
