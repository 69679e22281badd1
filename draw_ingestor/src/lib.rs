//! Lottery draw data model and the sources that supply draw results.
//!
//! The [`providers::ResultSource`] trait is the only thing the rest of the
//! workspace knows about a remote draw API; [`providers::lottery_rest`] is the
//! HTTP implementation used by the `draw-sync` binary.

pub mod models;
pub mod providers;
