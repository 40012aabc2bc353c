//! Typed handles over the resource actors.
//!
//! Clients are cheap to clone and hold no state of their own beyond the
//! channel, the shared clock and policy flags.

#[macro_use]
mod macros;
mod order_client;
mod stall_client;

pub use order_client::*;
pub use stall_client::*;
