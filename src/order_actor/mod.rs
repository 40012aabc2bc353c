//! Order store: the order record, its status machine and checkout validation.

pub mod entity;
pub mod error;
mod gate;
mod transitions;

pub use entity::StatusPatch;
pub use error::*;
pub use gate::*;
