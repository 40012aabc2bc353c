//! System orchestration, startup, and shutdown logic.

pub mod error;
pub mod health;
pub mod market_system;
pub mod seed;
pub mod tracing;

pub use error::*;
pub use health::*;
pub use market_system::*;
pub use seed::*;
pub use self::tracing::*;
