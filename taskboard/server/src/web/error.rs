use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthServiceError;
use crate::task::TaskServiceError;

const INTERNAL_ERROR_MESSAGE: &str =
    "An unexpected error occurred while processing your request. Please try again later.";

/// JSON body returned for every failed API request.
#[derive(Debug, Serialize, serde::Deserialize, ToSchema, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Machine readable error code, e.g. `NOT_FOUND`
    pub error: String,
    /// Description of what went wrong
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Error returned by API handlers. Each variant maps onto one HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or constraint-violating input.
    #[error("{0}")]
    Validation(String),
    /// A value outside of an enumerated set, such as an unknown status.
    #[error("{0}")]
    InvalidInput(String),
    /// Missing, invalid or expired credentials.
    #[error("{0}")]
    Unauthorized(String),
    /// Unknown id, or an id owned by another user.
    #[error("{0}")]
    NotFound(String),
    /// Conflicts with existing state, such as a duplicate registration.
    #[error("{0}")]
    Conflict(String),
    /// Anything the caller cannot fix. The detail is logged, never returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match self {
            ApiError::Internal(detail) => {
                tracing::error!("Request failed: {}", detail);
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            ApiError::Validation(message)
            | ApiError::InvalidInput(message)
            | ApiError::Unauthorized(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => message,
        };
        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<TaskServiceError> for ApiError {
    fn from(err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::Validation(_) => ApiError::Validation(err.to_string()),
            TaskServiceError::InvalidStatus(_) => ApiError::InvalidInput(err.to_string()),
            TaskServiceError::TaskNotFound(_) => ApiError::NotFound(err.to_string()),
            TaskServiceError::Database(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::EmptyName
            | AuthServiceError::InvalidEmail(_)
            | AuthServiceError::PasswordTooShort => ApiError::Validation(err.to_string()),
            AuthServiceError::DuplicateEmail(_) => ApiError::Conflict(err.to_string()),
            AuthServiceError::InvalidCredentials | AuthServiceError::InvalidToken => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthServiceError::PasswordHash(_)
            | AuthServiceError::Jwt(_)
            | AuthServiceError::Database(_) => ApiError::Internal(err.to_string()),
        }
    }
}

/// JSON body extractor that reports malformed input as an [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path extractor that reports malformed ids as an [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_yaml_snapshot;

    async fn body_of(response: Response) -> ErrorResponse {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn can_map_not_found_to_404() {
        let response = ApiError::from(TaskServiceError::TaskNotFound(42)).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_yaml_snapshot!(body_of(response).await, @r"
        error: NOT_FOUND
        message: Task with ID 42 not found
        ");
    }

    #[tokio::test]
    async fn can_hide_internal_error_details() {
        let response = ApiError::Internal("connection reset".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(response).await;
        assert_eq!(body.error, "INTERNAL_ERROR");
        assert_eq!(body.message, INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn can_map_duplicate_email_to_conflict() {
        let err = AuthServiceError::DuplicateEmail("a@b.io".to_string());
        let response = ApiError::from(err).into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_of(response).await.error, "CONFLICT");
    }

    #[tokio::test]
    async fn can_map_invalid_status_to_bad_request() {
        let err = TaskServiceError::InvalidStatus(taskboard_core::ParseStatusError(
            "bogus".to_string(),
        ));
        let response = ApiError::from(err).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await.error, "INVALID_INPUT");
    }
}
