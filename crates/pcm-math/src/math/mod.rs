//! Core math modules.

pub mod code_length;
pub mod order;
