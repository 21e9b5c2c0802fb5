// ABOUTME: API error type and its HTTP mapping
// ABOUTME: Converts workflow and storage failures into status codes with stable machine codes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use casebook_requirements::WorkflowError;
use casebook_storage::StorageError;

/// Error type returned by every handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Structured error body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorDetail,
    #[serde(rename = "requestId")]
    request_id: String,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// HTTP status and machine-readable code
    pub fn to_status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Workflow(err) => {
                let status = match err {
                    WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
                    WorkflowError::Unauthorized(_) => StatusCode::FORBIDDEN,
                    WorkflowError::InvalidTransition { .. }
                    | WorkflowError::InvalidState(_)
                    | WorkflowError::ConcurrentModification(_) => StatusCode::CONFLICT,
                    WorkflowError::CommentRequired(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
                    WorkflowError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code())
            }
            ApiError::Storage(err) => match err {
                StorageError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                StorageError::Duplicate(_) => (StatusCode::CONFLICT, "DUPLICATE"),
                StorageError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                StorageError::VersionConflict(_) => (StatusCode::CONFLICT, "CONCURRENT_MODIFICATION"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            },
        }
    }

    /// Message safe to show clients; backend details stay in the logs
    pub fn to_user_message(&self) -> String {
        match self {
            ApiError::Workflow(WorkflowError::Storage(_)) => "Data storage error".to_string(),
            ApiError::Storage(StorageError::NotFound) => "The requested resource was not found".to_string(),
            ApiError::Storage(
                StorageError::Duplicate(_)
                | StorageError::InvalidInput(_)
                | StorageError::VersionConflict(_),
            ) => self.to_string(),
            ApiError::Storage(_) => "Data storage error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status, code) = self.to_status_and_code();
        let message = self.to_user_message();

        if status.is_server_error() {
            error!(request_id = %request_id, error = %self, "Request failed");
        } else {
            warn!(request_id = %request_id, code = code, "{}", message);
        }

        let body = ErrorResponse {
            success: false,
            error: ErrorDetail { code, message },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use casebook_requirements::{RequirementStatus, ReviewActionKind};
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_workflow_status_mapping() {
        let cases = [
            (WorkflowError::NotFound("Requirement req-1".into()), StatusCode::NOT_FOUND),
            (WorkflowError::Unauthorized("no".into()), StatusCode::FORBIDDEN),
            (
                WorkflowError::InvalidTransition {
                    action: ReviewActionKind::Approve,
                    from: RequirementStatus::Draft,
                },
                StatusCode::CONFLICT,
            ),
            (WorkflowError::InvalidState("draft".into()), StatusCode::CONFLICT),
            (WorkflowError::ConcurrentModification("req-1".into()), StatusCode::CONFLICT),
            (WorkflowError::CommentRequired("reject".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (WorkflowError::Validation("bad".into()), StatusCode::BAD_REQUEST),
        ];

        for (err, expected) in cases {
            let code = err.code();
            let (status, mapped_code) = ApiError::from(err).to_status_and_code();
            assert_eq!(status, expected);
            assert_eq!(mapped_code, code);
        }
    }

    #[test]
    fn test_storage_failures_are_sanitised() {
        let err = ApiError::from(WorkflowError::Storage(StorageError::Database(
            "disk I/O error at /var/db".into(),
        )));
        assert_eq!(err.to_status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_user_message(), "Data storage error");

        let dup = ApiError::from(StorageError::Duplicate("email 'a@b.c'".into()));
        assert_eq!(dup.to_status_and_code(), (StatusCode::CONFLICT, "DUPLICATE"));
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
        assert!(body["requestId"].as_str().is_some());
    }
}
