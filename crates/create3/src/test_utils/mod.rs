//! Test utilities for the factory.

mod accounts;
mod payload;

pub use accounts::*;
pub use payload::*;
