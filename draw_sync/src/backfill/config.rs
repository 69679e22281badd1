use std::{num::NonZeroUsize, time::Duration};

use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};

/// Tuning knobs for a backfill run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    /// Ids per batch.
    pub batch_size: NonZeroUsize,
    /// Fetches in flight at once within a batch.
    pub workers: NonZeroUsize,
    /// Pause between two batches, in milliseconds.
    pub cooldown_ms: u64,
}

impl BackfillConfig {
    pub const DEFAULT_BATCH_SIZE: NonZeroUsize = nonzero!(10usize);
    pub const DEFAULT_WORKERS: NonZeroUsize = nonzero!(5usize);
    pub const DEFAULT_COOLDOWN_MS: u64 = 2_000;

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
            workers: Self::DEFAULT_WORKERS,
            cooldown_ms: Self::DEFAULT_COOLDOWN_MS,
        }
    }
}
