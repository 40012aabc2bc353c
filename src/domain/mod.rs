pub mod order;
pub mod stall;

pub use order::*;
pub use stall::*;
