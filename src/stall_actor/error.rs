use thiserror::Error;

use crate::actor_framework::FrameworkError;

/// Errors that can occur during stall ledger operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StallError {
    #[error("Stall not found: {0}")]
    NotFound(String),
    #[error("Stall already exists: {0}")]
    AlreadyExists(String),
    #[error("Stall validation error: {0}")]
    ValidationError(String),
    #[error("Transport failure: {0}")]
    TransportFailure(String),
}

impl From<FrameworkError<StallError>> for StallError {
    fn from(e: FrameworkError<StallError>) -> Self {
        match e {
            FrameworkError::Domain(e) => e,
            FrameworkError::NotFound(id) => StallError::NotFound(id),
            FrameworkError::AlreadyExists(id) => StallError::AlreadyExists(id),
            other => StallError::TransportFailure(other.to_string()),
        }
    }
}
