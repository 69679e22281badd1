//! Mode selection and the thin glue around the backfill engine.
//!
//! The binary turns command-line flags into [`ModeFlags`], [`ModeFlags::into_plan`]
//! validates them into a [`Plan`], and [`App::execute`] runs it:
//!
//! 1. build the working sample (date-range query, or replay of the store),
//! 2. print it when asked to,
//! 3. print the official statistics when asked to,
//! 4. run a gap-fill within the stored range and/or a bootstrap.

use std::{io::Write, sync::Arc, time::Duration};

use chrono::NaiveDate;
use draw_ingestor::{
    models::{
        date_range::{DateRange, DateRangeError},
        draw::DrawMap,
        statistics::OfficialStatistics,
    },
    providers::ResultSource,
};
use tracing::{error, info, warn};

use crate::{
    backfill::{BackfillConfig, BackfillReport, gap_fill},
    gaps::GapMode,
    store::DrawStore,
};

/// Raw mode flags as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ModeFlags {
    pub since: Option<NaiveDate>,
    pub till: Option<NaiveDate>,
    pub recent_days: Option<u64>,
    pub load: bool,
    pub analyze: bool,
    pub official_stats: bool,
    pub fill: bool,
    pub bootstrap: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    #[error("a date range query needs both --since and --till (or --recent)")]
    MissingDates,

    #[error(transparent)]
    Dates(#[from] DateRangeError),
}

/// Where the working sample comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sample {
    None,
    Range(DateRange),
    Stored,
}

/// A validated run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub sample: Sample,
    pub analyze: bool,
    pub official_stats: bool,
    /// Gap-fills to run, in order.
    pub gap_fills: Vec<GapMode>,
}

impl ModeFlags {
    /// Resolves the flags against `today` (used by `--recent`).
    ///
    /// A date-range query is the default mode: it runs whenever none of load,
    /// official-stats, fill or bootstrap was asked for, and then needs dates.
    pub fn into_plan(self, today: NaiveDate) -> Result<Plan, PlanError> {
        let range = match (self.recent_days, self.since, self.till) {
            (Some(days), _, _) => Some(DateRange::recent(today, days)?),
            (None, Some(since), Some(till)) => Some(DateRange::new(since, till)?),
            _ => None,
        };

        let sample = if self.load {
            Sample::Stored
        } else if !self.official_stats && !self.fill && !self.bootstrap {
            Sample::Range(range.ok_or(PlanError::MissingDates)?)
        } else {
            Sample::None
        };

        let mut gap_fills = Vec::new();
        if self.fill {
            gap_fills.push(GapMode::Within);
        }
        if self.bootstrap {
            gap_fills.push(GapMode::Bootstrap);
        }

        Ok(Plan {
            sample,
            analyze: self.analyze,
            official_stats: self.official_stats,
            gap_fills,
        })
    }
}

/// Source, store and backfill settings shared by every mode.
pub struct App {
    source: Arc<dyn ResultSource>,
    store: Arc<dyn DrawStore>,
    backfill: BackfillConfig,
}

impl App {
    pub fn new(
        source: Arc<dyn ResultSource>,
        store: Arc<dyn DrawStore>,
        backfill: BackfillConfig,
    ) -> Self {
        Self {
            source,
            store,
            backfill,
        }
    }

    /// Runs `plan`, writing user-facing output to `out`.
    ///
    /// Returns one report per gap-fill. Fails on the first fatal error: an
    /// undeterminable gap-fill range, an unreadable store, or a failed statistics fetch.
    pub async fn execute(
        &self,
        plan: &Plan,
        out: &mut impl Write,
    ) -> anyhow::Result<Vec<BackfillReport>> {
        let sample = match &plan.sample {
            Sample::None => DrawMap::new(),
            Sample::Stored => self.store.get_all().await?,
            Sample::Range(range) => self.query_range(*range).await,
        };

        if plan.analyze {
            print_sample(out, &sample)?;
        }

        if plan.official_stats {
            let stats = self.source.fetch_official_statistics().await?;
            print_statistics(out, &stats)?;
        }

        let mut reports = Vec::with_capacity(plan.gap_fills.len());
        for &mode in &plan.gap_fills {
            let report = gap_fill(
                Arc::clone(&self.source),
                Arc::clone(&self.store),
                self.backfill.clone(),
                mode,
            )
            .await?;
            reports.push(report);
        }
        Ok(reports)
    }

    /// Fetches a date range and persists it.
    ///
    /// A failed fetch is reported and yields an empty sample. A failed write is
    /// reported but the fetched draws are still returned.
    pub async fn query_range(&self, range: DateRange) -> DrawMap {
        let draws = match self.source.fetch_by_date_range(range).await {
            Ok(draws) => draws,
            Err(e) => {
                warn!(since = %range.since(), till = %range.till(), error = %e, "date range query failed");
                return DrawMap::new();
            }
        };

        info!(count = draws.len(), since = %range.since(), till = %range.till(), "fetched draws");
        if let Err(e) = self.store.put(&draws).await {
            error!(error = %e, "failed to persist date range results");
        }
        draws
    }
}

/// One line per draw, ascending by id.
pub fn print_sample(out: &mut impl Write, sample: &DrawMap) -> std::io::Result<()> {
    for (id, draw) in sample {
        writeln!(
            out,
            "{id}: Winning Numbers:{:?} Bonus:{:?}",
            draw.winning_numbers, draw.bonus_numbers
        )?;
    }
    Ok(())
}

/// Main numbers, a separator line, then bonus numbers, one per line.
pub fn print_statistics(out: &mut impl Write, stats: &OfficialStatistics) -> std::io::Result<()> {
    for number in &stats.numbers {
        writeln!(out, "{number}")?;
    }
    writeln!(out, "{}", "*".repeat(80))?;
    for bonus in &stats.bonus_numbers {
        writeln!(out, "{bonus}")?;
    }
    Ok(())
}

/// Human summary of a gap-fill, e.g. `Completed retrieving 20 draws in 4.02s (1 failed: [7])`.
pub fn summarize(report: &BackfillReport) -> String {
    let elapsed = format_elapsed(report.elapsed);
    if report.is_complete() {
        format!(
            "Completed retrieving {} draws in {elapsed}",
            report.fetched.len()
        )
    } else {
        format!(
            "Completed retrieving {} draws in {elapsed} ({} failed: {:?})",
            report.fetched.len(),
            report.failed.len(),
            report.failed_ids()
        )
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use draw_ingestor::models::draw::{DrawResult, into_draw_map};

    use crate::backfill::{FailedDraw, FailureReason};

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn today() -> NaiveDate {
        d(2024, 5, 20)
    }

    #[test]
    fn explicit_range_is_the_default_mode() {
        let plan = ModeFlags {
            since: Some(d(2024, 1, 1)),
            till: Some(d(2024, 1, 31)),
            analyze: true,
            ..Default::default()
        }
        .into_plan(today())
        .unwrap();

        assert_eq!(
            plan.sample,
            Sample::Range(DateRange::new(d(2024, 1, 1), d(2024, 1, 31)).unwrap())
        );
        assert!(plan.analyze);
        assert!(plan.gap_fills.is_empty());
    }

    #[test]
    fn recent_counts_back_from_today() {
        let plan = ModeFlags {
            recent_days: Some(10),
            ..Default::default()
        }
        .into_plan(today())
        .unwrap();
        assert_eq!(
            plan.sample,
            Sample::Range(DateRange::new(d(2024, 5, 10), today()).unwrap())
        );
    }

    #[test]
    fn analyze_alone_needs_dates() {
        let err = ModeFlags {
            analyze: true,
            ..Default::default()
        }
        .into_plan(today())
        .unwrap_err();
        assert!(matches!(err, PlanError::MissingDates));
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let err = ModeFlags {
            since: Some(d(2024, 2, 1)),
            till: Some(d(2024, 1, 1)),
            ..Default::default()
        }
        .into_plan(today())
        .unwrap_err();
        assert!(matches!(err, PlanError::Dates(DateRangeError::Reversed { .. })));
    }

    #[test]
    fn fill_and_bootstrap_skip_the_range_query() {
        let plan = ModeFlags {
            fill: true,
            bootstrap: true,
            ..Default::default()
        }
        .into_plan(today())
        .unwrap();
        assert_eq!(plan.sample, Sample::None);
        assert_eq!(plan.gap_fills, vec![GapMode::Within, GapMode::Bootstrap]);
    }

    #[test]
    fn load_replays_the_store_even_with_dates() {
        let plan = ModeFlags {
            load: true,
            since: Some(d(2024, 1, 1)),
            till: Some(d(2024, 1, 2)),
            ..Default::default()
        }
        .into_plan(today())
        .unwrap();
        assert_eq!(plan.sample, Sample::Stored);
    }

    #[test]
    fn official_stats_alone_needs_no_dates() {
        let plan = ModeFlags {
            official_stats: true,
            ..Default::default()
        }
        .into_plan(today())
        .unwrap();
        assert_eq!(plan.sample, Sample::None);
        assert!(plan.official_stats);
    }

    #[test]
    fn sample_is_printed_in_id_order() {
        let sample = into_draw_map([
            DrawResult::new(12, vec![5, 11, 23, 30, 41, 49], vec![]),
            DrawResult::new(3, vec![1, 8, 19, 27, 33, 45], vec![6]),
        ]);
        let mut out = Vec::new();
        print_sample(&mut out, &sample).unwrap();
        let text = String::from_utf8(out).unwrap();
        insta::assert_snapshot!(text.trim_end(), @r"
        3: Winning Numbers:[1, 8, 19, 27, 33, 45] Bonus:[6]
        12: Winning Numbers:[5, 11, 23, 30, 41, 49] Bonus:[]
        ");
    }

    #[test]
    fn statistics_layout() {
        let stats = OfficialStatistics {
            numbers: vec![17, 4],
            bonus_numbers: vec![9],
        };
        let mut out = Vec::new();
        print_statistics(&mut out, &stats).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rule = "*".repeat(80);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["17", "4", rule.as_str(), "9"]);
    }

    #[test]
    fn summary_lists_failed_ids() {
        let report = BackfillReport {
            requested: 3,
            batches: 1,
            fetched: vec![1, 3],
            failed: vec![FailedDraw {
                id: 2,
                reason: FailureReason::Fetch("HTTP 500".into()),
            }],
            elapsed: Duration::from_millis(4_020),
        };
        assert_eq!(
            summarize(&report),
            "Completed retrieving 2 draws in 4.02s (1 failed: [2])"
        );

        let clean = BackfillReport::default();
        assert_eq!(summarize(&clean), "Completed retrieving 0 draws in 0.00s");
    }
}
