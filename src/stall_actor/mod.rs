//! Stall access ledger: onboarding records and the paid access window.

mod actions;
mod countdown;
pub mod entity;
pub mod error;

pub use actions::*;
pub use countdown::*;
pub use error::*;
