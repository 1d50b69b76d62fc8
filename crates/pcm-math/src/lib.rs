//! Periodic cycle miner math utilities.

pub mod math;

pub use math::code_length::*;
pub use math::order::*;
