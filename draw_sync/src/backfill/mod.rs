//! Concurrent batched backfill of missing draws.
//!
//! ## How a run proceeds
//! - The missing ids are split into consecutive batches of at most `batch_size` ids, in
//!   ascending id order.
//! - Batches run strictly one after another. Inside a batch every id gets its own task
//!   in a [`JoinSet`]; a [`Semaphore`] caps how many fetches are in flight at once.
//! - Results are handled in completion order. Each success is written to the store on
//!   its own, so a crash mid-batch only loses fetches that were still in flight.
//! - A failed fetch or a failed write is recorded in the [`BackfillReport`] and the run
//!   moves on. Nothing is retried within a run; the id stays missing and the next
//!   gap-fill picks it up again.
//! - Between two batches the coordinator sleeps for `cooldown` to stay under upstream
//!   rate limits.

mod config;

use std::{collections::BTreeSet, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use draw_ingestor::{
    models::draw::{DrawId, DrawMap, DrawResult},
    providers::{ProviderError, ResultSource},
};
use futures::FutureExt;
use roaring::RoaringBitmap;
use tokio::{sync::Semaphore, task::JoinSet, time::Instant};
use tracing::{error, info, warn};

pub use config::BackfillConfig;

use crate::{
    errors::BackfillError,
    gaps::{GapMode, missing_ids, resolve_range, stored_ids},
    store::DrawStore,
};

/// Why a draw is still missing after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The source could not deliver the draw.
    Fetch(String),
    /// The draw was fetched but could not be written.
    Persist(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDraw {
    pub id: DrawId,
    pub reason: FailureReason,
}

/// Outcome of one backfill run.
#[derive(Debug, Clone, Default)]
pub struct BackfillReport {
    /// Number of ids the run set out to retrieve.
    pub requested: u64,
    /// Number of batches processed.
    pub batches: usize,
    /// Ids fetched and persisted, in completion order.
    pub fetched: Vec<DrawId>,
    /// Ids that are still missing, with the reason.
    pub failed: Vec<FailedDraw>,
    /// Wall-clock time of the run. Zero when there was nothing to do.
    pub elapsed: Duration,
}

impl BackfillReport {
    pub fn failed_ids(&self) -> Vec<DrawId> {
        let mut ids: Vec<_> = self.failed.iter().map(|f| f.id).collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Splits `ids` into consecutive batches of at most `batch_size`, ascending.
pub fn partition(ids: &RoaringBitmap, batch_size: usize) -> Vec<Vec<DrawId>> {
    let batch_size = batch_size.max(1);
    let ids: Vec<DrawId> = ids.iter().collect();
    ids.chunks(batch_size).map(<[DrawId]>::to_vec).collect()
}

type FetchOutcome = Result<Result<DrawResult, ProviderError>, String>;

/// Drives a set of missing ids through the source and into the store.
pub struct Backfiller {
    source: Arc<dyn ResultSource>,
    store: Arc<dyn DrawStore>,
    config: BackfillConfig,
}

impl Backfiller {
    pub fn new(
        source: Arc<dyn ResultSource>,
        store: Arc<dyn DrawStore>,
        config: BackfillConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Fetches and persists every id in `missing`.
    ///
    /// Never fails as a whole; per-draw failures end up in [`BackfillReport::failed`].
    pub async fn run(&self, missing: &RoaringBitmap) -> BackfillReport {
        let mut report = BackfillReport {
            requested: missing.len(),
            ..Default::default()
        };
        if missing.is_empty() {
            return report;
        }

        let started = Instant::now();
        let batches = partition(missing, self.config.batch_size.get());
        let total = batches.len();
        let cooldown = self.config.cooldown();

        for (index, batch) in batches.iter().enumerate() {
            info!(batch = index + 1, of = total, ids = ?batch, "Retrieving");
            self.run_batch(batch, &mut report).await;
            report.batches += 1;

            if index + 1 < total && !cooldown.is_zero() {
                tokio::time::sleep(cooldown).await;
            }
        }

        report.elapsed = started.elapsed();
        info!(
            fetched = report.fetched.len(),
            failed = report.failed.len(),
            elapsed = ?report.elapsed,
            "Completed retrieving"
        );
        report
    }

    async fn run_batch(&self, batch: &[DrawId], report: &mut BackfillReport) {
        let permits = Arc::new(Semaphore::new(self.config.workers.get()));
        let mut tasks: JoinSet<(DrawId, FetchOutcome)> = JoinSet::new();

        for &id in batch {
            let source = Arc::clone(&self.source);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (id, Err("worker pool closed".to_string()));
                };
                // A panicking fetch must not take its siblings down with it.
                let outcome = AssertUnwindSafe(source.fetch_by_id(id))
                    .catch_unwind()
                    .await
                    .map_err(|_| "fetch task panicked".to_string());
                (id, outcome)
            });
        }

        let mut pending: BTreeSet<DrawId> = batch.iter().copied().collect();
        let mut accumulator = DrawMap::new();

        while let Some(joined) = tasks.join_next().await {
            let (id, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    error!(error = %e, "fetch task did not complete");
                    continue;
                }
            };
            pending.remove(&id);

            let draw = match outcome {
                Ok(Ok(draw)) if draw.game_id == id => draw,
                Ok(Ok(draw)) => {
                    warn!(id, returned = draw.game_id, "source returned a different draw");
                    report.failed.push(FailedDraw {
                        id,
                        reason: FailureReason::Fetch(format!(
                            "requested draw {id} but got draw {}",
                            draw.game_id
                        )),
                    });
                    continue;
                }
                Ok(Err(e)) => {
                    warn!(id, error = %e, "fetch failed");
                    report.failed.push(FailedDraw {
                        id,
                        reason: FailureReason::Fetch(e.to_string()),
                    });
                    continue;
                }
                Err(reason) => {
                    warn!(id, %reason, "fetch failed");
                    report.failed.push(FailedDraw {
                        id,
                        reason: FailureReason::Fetch(reason),
                    });
                    continue;
                }
            };

            accumulator.insert(id, draw);
            match self.store.put(&accumulator).await {
                Ok(()) => report.fetched.push(id),
                Err(e) => {
                    error!(id, error = %e, "failed to persist draw");
                    report.failed.push(FailedDraw {
                        id,
                        reason: FailureReason::Persist(e.to_string()),
                    });
                }
            }
            accumulator.clear();
        }

        // Only reachable if the runtime tore a task down.
        for id in pending {
            report.failed.push(FailedDraw {
                id,
                reason: FailureReason::Fetch("fetch task aborted".to_string()),
            });
        }
    }
}

/// Fills the gaps in the stored draw history.
///
/// Reads a fresh snapshot of the store, resolves the id window for `mode`, and
/// backfills whatever is missing. Returns an error only when the window cannot be
/// determined; nothing has been fetched or written in that case.
pub async fn gap_fill(
    source: Arc<dyn ResultSource>,
    store: Arc<dyn DrawStore>,
    config: BackfillConfig,
    mode: GapMode,
) -> Result<BackfillReport, BackfillError> {
    let snapshot = store.get_all().await?;
    let stored = stored_ids(snapshot.keys());
    drop(snapshot);

    let (start, stop) = resolve_range(mode, &stored, source.as_ref()).await?;
    let missing = missing_ids(&stored, start, stop)?;

    if mode == GapMode::Within {
        let ids: Vec<DrawId> = missing.iter().collect();
        info!(start, stop, missing = ?ids, "Retrieving the following missing draws");
    } else {
        info!(start, stop, missing = missing.len(), "Bootstrapping draw history");
    }

    Ok(Backfiller::new(source, store, config).run(&missing).await)
}
