use thiserror::Error;

/// Delivered on a subscription's error channel. After an error the
/// subscription delivers nothing more; the subscriber re-establishes it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedError {
    #[error("Transport failure: {0}")]
    TransportFailure(String),
}
