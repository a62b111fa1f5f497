//! Command implementations

pub mod animations;
pub mod info;
pub mod sample;
pub mod tree;
