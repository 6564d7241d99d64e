use kz_core::{KaziError, StoreError, TemplateError, WorkflowError};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Kazi(#[from] KaziError),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid board file {path}: {message}")]
    Board { path: String, message: String },
    #[error("{message}")]
    Config { message: String },
    #[error("json output failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<TemplateError> for CliError {
    fn from(value: TemplateError) -> Self {
        Self::Kazi(KaziError::Template(value))
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Kazi(KaziError::Store(value))
    }
}

impl From<WorkflowError> for CliError {
    fn from(value: WorkflowError) -> Self {
        Self::Kazi(KaziError::Workflow(value))
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
