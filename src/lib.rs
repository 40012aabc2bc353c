//! Ordering core for campus food stalls.
//!
//! Stalls pay for time-boxed access windows; while a stall's window is open
//! customers can place orders, which the vendor dashboard and the customer's
//! receipt follow live through the change feed.

pub mod actor_framework;
pub mod app_system;
pub mod clients;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod feed;
pub mod order_actor;
pub mod sequencing;
pub mod stall_actor;

#[cfg(test)]
mod mock_framework;

pub use app_system::{setup_tracing, MarketSystem, SystemError};
pub use config::AppConfig;
