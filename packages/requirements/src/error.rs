// ABOUTME: Error type for workflow commands
// ABOUTME: Distinguishes rule violations from storage failures and exposes stable codes

use thiserror::Error;

use casebook_storage::StorageError;

use crate::types::{ReviewActionKind, RequirementStatus};

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Cannot {action} a requirement in status {from}")]
    InvalidTransition {
        action: ReviewActionKind,
        from: RequirementStatus,
    },

    #[error("A comment is required to {0}")]
    CommentRequired(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Requirement {0} was changed by someone else; reload and retry")]
    ConcurrentModification(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(StorageError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl WorkflowError {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::NotFound(_) => "NOT_FOUND",
            WorkflowError::Unauthorized(_) => "UNAUTHORIZED",
            WorkflowError::InvalidTransition { .. } => "INVALID_TRANSITION",
            WorkflowError::CommentRequired(_) => "COMMENT_REQUIRED",
            WorkflowError::InvalidState(_) => "INVALID_STATE",
            WorkflowError::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            WorkflowError::Validation(_) => "VALIDATION_ERROR",
            WorkflowError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// True for rejections caused by the caller rather than the backend
    pub fn is_rule_violation(&self) -> bool {
        !matches!(self, WorkflowError::Storage(_))
    }
}

impl From<StorageError> for WorkflowError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => WorkflowError::NotFound("Record".to_string()),
            StorageError::VersionConflict(id) => WorkflowError::ConcurrentModification(id),
            StorageError::InvalidInput(msg) => WorkflowError::Validation(msg),
            StorageError::Duplicate(what) => {
                WorkflowError::Validation(format!("{} already exists", what))
            }
            other => WorkflowError::Storage(other),
        }
    }
}
