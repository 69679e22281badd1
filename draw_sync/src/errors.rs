use draw_ingestor::{models::draw::DrawId, providers::ProviderError};
use thiserror::Error;

use crate::store::StoreError;

/// Failures that stop a gap-fill before any draw is fetched.
///
/// Per-draw fetch and persist failures never surface here; they are collected in
/// [`BackfillReport`](crate::backfill::BackfillReport).
#[derive(Debug, Error)]
pub enum BackfillError {
    /// The requested id window is empty or reversed.
    #[error("invalid draw range: start {start} is after stop {stop}")]
    InvalidRange { start: DrawId, stop: DrawId },

    /// A fill within the stored range was requested but nothing is stored yet.
    #[error("invalid draw range: the store is empty, run a bootstrap first")]
    EmptyStore,

    /// The active draw could not be fetched, so the bootstrap range has no upper bound.
    #[error("cannot determine the active draw: {source}")]
    ActiveDrawUnavailable {
        #[source]
        source: ProviderError,
    },

    /// The store snapshot could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
}
