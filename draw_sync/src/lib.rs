//! Local cache of lottery draw history with concurrent gap backfill.
//!
//! - [`store`]: the SQLite-backed draw store.
//! - [`gaps`]: which draw ids are missing.
//! - [`backfill`]: batched, bounded-concurrency retrieval of the missing ids.
//! - [`app`]: mode selection for the `draw-sync` binary.

pub mod app;
pub mod backfill;
pub mod config;
pub mod db;
pub mod errors;
pub mod gaps;
pub mod logging;
pub mod schema;
pub mod store;
