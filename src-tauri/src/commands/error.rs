//! Command error shape
//!
//! Failed commands reject with `{status, error}`; statuses follow HTTP so
//! the frontend maps them the same way it would map a web backend.

use serde::Serialize;

use crate::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandError {
    pub status: u16,
    pub error: String,
}

impl From<DomainError> for CommandError {
    fn from(err: DomainError) -> Self {
        let (status, error) = match err {
            DomainError::NotFound(msg) => (404, msg),
            DomainError::InvalidInput(msg) => (400, msg),
            DomainError::Conflict(msg) => (409, msg),
            DomainError::Internal(msg) => {
                tracing::error!(error = %msg, "command failed");
                (500, msg)
            }
        };
        Self { status, error }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;
