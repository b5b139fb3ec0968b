//! Helpers for working with A2A protocol types.

pub mod constants;
pub mod message;
pub mod parts;

pub use constants::*;
pub use message::*;
pub use parts::*;
