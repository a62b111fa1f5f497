//! Nima-RS library
//!
//! Command implementations and terminal helpers behind the `nima-rs` binary.

pub mod cli;
pub mod commands;
pub mod utils;
