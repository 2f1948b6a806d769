use thiserror::Error;

use crate::directory::DirectoryError;
use crate::models::request::{RequestAction, RequestStatus};

/// Typed outcome of a rejected workflow command. Every variant is
/// recoverable; the engine never retries on its own.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("validation failed: {}", .0.join(", "))]
    ValidationFailed(Vec<String>),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("cannot {action} a request in status {from}")]
    InvalidTransition {
        from: RequestStatus,
        action: RequestAction,
    },
    #[error("directory lookup failed: {0}")]
    DirectoryLookupFailed(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::ValidationFailed(vec![message.into()])
    }
}

impl From<validator::ValidationErrors> for WorkflowError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter()
                    .map(move |e| format!("{}: {}", field, e.code))
            })
            .collect();
        messages.sort();
        WorkflowError::ValidationFailed(messages)
    }
}

impl From<DirectoryError> for WorkflowError {
    fn from(err: DirectoryError) -> Self {
        WorkflowError::DirectoryLookupFailed(err.to_string())
    }
}
