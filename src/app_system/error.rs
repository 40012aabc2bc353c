use thiserror::Error;

use crate::config::ConfigError;
use crate::feed::FeedError;
use crate::order_actor::OrderError;
use crate::stall_actor::StallError;

/// Errors surfaced by the system coordinator and the demo binary.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Stall(#[from] StallError),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("Actor task failed: {0}")]
    ActorTask(String),
    #[error("Actor did not stop within {0:?}")]
    ShutdownTimeout(std::time::Duration),
}
