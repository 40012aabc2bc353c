use thiserror::Error;

use crate::actor_framework::FrameworkError;
use crate::domain::{OrderStatus, StallStatus};
use crate::stall_actor::StallError;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Stall {stall_id} is not accepting orders ({status})")]
    StallUnavailable { stall_id: String, status: StallStatus },
    #[error("Stall not found: {0}")]
    StallNotFound(String),
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Order validation error: {0}")]
    ValidationError(String),
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error("Transport failure: {0}")]
    TransportFailure(String),
}

impl From<FrameworkError<OrderError>> for OrderError {
    fn from(e: FrameworkError<OrderError>) -> Self {
        match e {
            FrameworkError::Domain(e) => e,
            FrameworkError::NotFound(id) => OrderError::NotFound(id),
            FrameworkError::AlreadyExists(id) => {
                OrderError::ValidationError(format!("Order id already taken: {}", id))
            }
            other => OrderError::TransportFailure(other.to_string()),
        }
    }
}

impl From<StallError> for OrderError {
    fn from(e: StallError) -> Self {
        match e {
            StallError::NotFound(id) => OrderError::StallNotFound(id),
            StallError::TransportFailure(msg) => OrderError::TransportFailure(msg),
            other => OrderError::ValidationError(other.to_string()),
        }
    }
}
