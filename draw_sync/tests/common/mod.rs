#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use diesel::{
    QueryableByName,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    sql_types::{Integer, Text},
};
use draw_ingestor::{
    models::{
        date_range::DateRange,
        draw::{DrawId, DrawMap, DrawResult},
        statistics::OfficialStatistics,
    },
    providers::{ApiSnafu, ProviderError, ResultSource},
};
use draw_sync::{
    backfill::BackfillConfig,
    store::{DrawStore, SqliteDrawStore, StoreError},
};
use tempfile::TempDir;

pub struct TestDb {
    _dir: TempDir,     // keep alive for the life of the test
    pub path: PathBuf, // <tmpdir>/data/results.db
}

/// A fresh store in a temporary directory. The `data/` sub-directory does not exist
/// beforehand, so opening also exercises directory creation.
pub fn setup_store() -> (TestDb, SqliteDrawStore) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("data").join("results.db");
    let store = SqliteDrawStore::open(&path).expect("open store");
    (TestDb { _dir: dir, path }, store)
}

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}

#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

/// Deterministic draw for an id.
pub fn draw_for(id: DrawId) -> DrawResult {
    let base = id % 40;
    DrawResult::new(
        id,
        (1..=6).map(|k| base + k).collect(),
        vec![id % 10 + 1],
    )
}

pub fn draws(ids: impl IntoIterator<Item = DrawId>) -> DrawMap {
    ids.into_iter().map(|id| (id, draw_for(id))).collect()
}

/// Backfill settings without the inter-batch pause.
pub fn fast_config(batch_size: usize, workers: usize) -> BackfillConfig {
    BackfillConfig {
        batch_size: batch_size.try_into().expect("non-zero batch size"),
        workers: workers.try_into().expect("non-zero workers"),
        cooldown_ms: 0,
    }
}

/// Scripted result source: every id resolves to [`draw_for`] unless told otherwise.
#[derive(Default)]
pub struct ScriptedSource {
    active: Option<DrawId>,
    failing: HashSet<DrawId>,
    panicking: HashSet<DrawId>,
    delay: Duration,
    delays: HashMap<DrawId, Duration>,
    relabeled: HashMap<DrawId, DrawId>,
    range_draws: Option<DrawMap>,
    stats: OfficialStatistics,

    calls: Mutex<Vec<DrawId>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
    completed_before_start: Mutex<Vec<(DrawId, usize)>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_active(mut self, id: DrawId) -> Self {
        self.active = Some(id);
        self
    }

    pub fn failing_on(mut self, ids: impl IntoIterator<Item = DrawId>) -> Self {
        self.failing.extend(ids);
        self
    }

    pub fn panicking_on(mut self, ids: impl IntoIterator<Item = DrawId>) -> Self {
        self.panicking.extend(ids);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Per-id delay, overriding [`Self::with_delay`] for those ids.
    pub fn with_delays(mut self, delays: impl IntoIterator<Item = (DrawId, Duration)>) -> Self {
        self.delays.extend(delays);
        self
    }

    /// Answers a request for `requested` with the draw for `returned`.
    pub fn relabeling(mut self, requested: DrawId, returned: DrawId) -> Self {
        self.relabeled.insert(requested, returned);
        self
    }

    pub fn with_range_draws(mut self, draws: DrawMap) -> Self {
        self.range_draws = Some(draws);
        self
    }

    pub fn with_stats(mut self, stats: OfficialStatistics) -> Self {
        self.stats = stats;
        self
    }

    /// Ids passed to `fetch_by_id`, in call order.
    pub fn calls(&self) -> Vec<DrawId> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, id: DrawId) -> usize {
        self.calls().iter().filter(|&&c| c == id).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// For each call, how many fetches had already finished when it started.
    pub fn completed_before_start(&self) -> Vec<(DrawId, usize)> {
        self.completed_before_start.lock().unwrap().clone()
    }
}

fn unavailable(what: &str) -> ProviderError {
    ApiSnafu {
        status: 503u16,
        message: format!("{what} unavailable"),
    }
    .build()
}

#[async_trait]
impl ResultSource for ScriptedSource {
    async fn fetch_by_date_range(&self, _range: DateRange) -> Result<DrawMap, ProviderError> {
        self.range_draws
            .clone()
            .ok_or_else(|| unavailable("date range"))
    }

    async fn fetch_by_id(&self, id: DrawId) -> Result<DrawResult, ProviderError> {
        self.calls.lock().unwrap().push(id);
        self.completed_before_start
            .lock()
            .unwrap()
            .push((id, self.completed.load(Ordering::SeqCst)));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(&id).copied().unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.panicking.contains(&id) {
            panic!("scripted panic for draw {id}");
        }
        if self.failing.contains(&id) {
            return Err(unavailable(&format!("draw {id}")));
        }
        Ok(draw_for(self.relabeled.get(&id).copied().unwrap_or(id)))
    }

    async fn fetch_active_draw(&self) -> Result<DrawResult, ProviderError> {
        self.active
            .map(draw_for)
            .ok_or_else(|| unavailable("active draw"))
    }

    async fn fetch_official_statistics(&self) -> Result<OfficialStatistics, ProviderError> {
        Ok(self.stats.clone())
    }
}

/// In-memory store that records every write and can refuse writes for chosen ids.
#[derive(Default)]
pub struct MemoryStore {
    draws: Mutex<DrawMap>,
    rejected: HashSet<DrawId>,
    puts: Mutex<Vec<Vec<DrawId>>>,
}

impl MemoryStore {
    pub fn with_draws(draws: DrawMap) -> Self {
        Self {
            draws: Mutex::new(draws),
            ..Default::default()
        }
    }

    pub fn rejecting(mut self, ids: impl IntoIterator<Item = DrawId>) -> Self {
        self.rejected.extend(ids);
        self
    }

    pub fn ids(&self) -> Vec<DrawId> {
        self.draws.lock().unwrap().keys().copied().collect()
    }

    /// Keys of every `put` call, in call order.
    pub fn puts(&self) -> Vec<Vec<DrawId>> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DrawStore for MemoryStore {
    async fn put(&self, draws: &DrawMap) -> Result<(), StoreError> {
        self.puts
            .lock()
            .unwrap()
            .push(draws.keys().copied().collect());

        if let Some(id) = draws.keys().find(|id| self.rejected.contains(id)) {
            return Err(StoreError::Query(DieselError::DatabaseError(
                DatabaseErrorKind::Unknown,
                Box::new(format!("disk full while writing draw {id}")),
            )));
        }
        self.draws
            .lock()
            .unwrap()
            .extend(draws.iter().map(|(k, v)| (*k, v.clone())));
        Ok(())
    }

    async fn get_all(&self) -> Result<DrawMap, StoreError> {
        Ok(self.draws.lock().unwrap().clone())
    }
}
