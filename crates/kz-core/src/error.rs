use crate::types::enums::ReviewStatus;
use crate::types::ids::{IdError, ReviewId, StageId};
use thiserror::Error;

/// Failures of the pure review workflow engine. None of them leave a
/// partially applied review behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("validation failed: {message}")]
    Validation { message: String },
    #[error("review is not open for feedback (status {status})")]
    InvalidState { status: ReviewStatus },
    #[error("stage mismatch: current stage is {expected}, got {got}")]
    StageMismatch { expected: StageId, got: StageId },
}

impl WorkflowError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("review not found: {id}")]
    ReviewNotFound { id: ReviewId },
    #[error("review already exists: {id}")]
    ReviewExists { id: ReviewId },
    #[error("version conflict on {id}: expected {expected}, found {found}")]
    VersionConflict {
        id: ReviewId,
        expected: u64,
        found: u64,
    },
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {name}")]
    TemplateNotFound { name: String },
    #[error("invalid template: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum KaziError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Id(#[from] IdError),
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl From<serde_json::Error> for KaziError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal {
            message: value.to_string(),
        }
    }
}
