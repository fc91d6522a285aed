//! Error taxonomy for the todo server.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use todo_shared::{ErrorBody, TaskId};

/// Failures the task store reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Todo text is required")]
    Validation,
    #[error("Todo not found")]
    NotFound(TaskId),
}

/// Everything a handler can fail with, mapped onto a status code and `{error}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A path id that is not a positive integer can never name a record.
    #[error("Todo not found")]
    UnknownId(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::Validation) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(StoreError::NotFound(_)) | ApiError::UnknownId(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Unexpected(detail) => {
                tracing::error!(%detail, "unexpected failure while handling request");
                "Something went wrong!".to_string()
            }
            other => {
                tracing::debug!(error = %other, status = status.as_u16(), "request rejected");
                other.to_string()
            }
        };
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::Store(StoreError::Validation), StatusCode::BAD_REQUEST)]
    #[case(ApiError::BadRequest("bad json".into()), StatusCode::BAD_REQUEST)]
    #[case(ApiError::Store(StoreError::NotFound(4)), StatusCode::NOT_FOUND)]
    #[case(ApiError::UnknownId("abc".into()), StatusCode::NOT_FOUND)]
    #[case(ApiError::Unexpected("boom".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_errors_to_status(#[case] error: ApiError, #[case] expected: StatusCode) {
        assert_eq!(error.status(), expected);
        assert_eq!(error.into_response().status(), expected);
    }

    #[test]
    fn store_errors_carry_client_facing_messages() {
        assert_eq!(StoreError::Validation.to_string(), "Todo text is required");
        assert_eq!(StoreError::NotFound(9).to_string(), "Todo not found");
    }
}
