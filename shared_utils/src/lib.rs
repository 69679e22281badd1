//! Small helpers shared by the draw history crates.

pub mod env;
