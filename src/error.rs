use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::SessionError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Profile storage is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Caller is not allowed to act on the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => ServiceError::NotFound(format!("session `{id}`")),
            SessionError::InvalidInput(message) => ServiceError::InvalidInput(message),
            SessionError::NotAPlayer(_) => ServiceError::Forbidden(err.to_string()),
            SessionError::Full | SessionError::NotStarted | SessionError::NotYourTurn(_) => {
                ServiceError::InvalidState(err.to_string())
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Caller may not perform the action.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        ServiceError::from(err).into()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: SessionError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn session_errors_map_to_client_statuses() {
        assert_eq!(status_of(SessionError::NotFound("ABC123".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(SessionError::Full), StatusCode::CONFLICT);
        assert_eq!(status_of(SessionError::NotStarted), StatusCode::CONFLICT);
        assert_eq!(status_of(SessionError::NotYourTurn(1)), StatusCode::CONFLICT);
        assert_eq!(
            status_of(SessionError::InvalidInput("Please enter a player name".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(SessionError::NotAPlayer("u9".into())), StatusCode::FORBIDDEN);
    }

    #[test]
    fn blank_guess_message_reaches_the_client() {
        let err = AppError::from(SessionError::InvalidInput("Please enter a player name".into()));
        assert_eq!(err.to_string(), "bad request: Please enter a player name");
    }

    #[test]
    fn storage_failures_are_unavailable() {
        let err = ServiceError::from(StorageError::unavailable("disk gone".into(), std::io::Error::other("boom")));
        assert_eq!(AppError::from(err).into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
