use std::{num::NonZeroUsize, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, CommandFactory, Parser, error::ErrorKind};
use draw_ingestor::{
    models::date_range::parse_date,
    providers::lottery_rest::LotteryRestSource,
};
use draw_sync::{
    app::{App, ModeFlags, summarize},
    config::AppConfig,
    logging::init_logging,
    store::SqliteDrawStore,
};

#[derive(Parser)]
#[command(version, about = "Fetch, cache and backfill lottery draw results")]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .multiple(true)
        .args(["since", "recent", "load", "analyze", "official_stats", "fill", "bootstrap"])
))]
struct Cli {
    /// Path to the config file (draw_sync.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start date of a date range query (YYYY-MM-DD)
    #[arg(short = 's', long, value_name = "DATE", value_parser = parse_date, requires = "till", conflicts_with = "recent")]
    since: Option<NaiveDate>,

    /// End date of a date range query (YYYY-MM-DD)
    #[arg(short = 't', long, value_name = "DATE", value_parser = parse_date, requires = "since")]
    till: Option<NaiveDate>,

    /// Query the last DAYS days up to today
    #[arg(short = 'r', long, value_name = "DAYS")]
    recent: Option<u64>,

    /// Replay the cached draws instead of querying the API
    #[arg(short = 'l', long)]
    load: bool,

    /// Print the working sample
    #[arg(short = 'a', long)]
    analyze: bool,

    /// Print the operator's official number statistics
    #[arg(short = 'o', long)]
    official_stats: bool,

    /// Fill gaps between the lowest and highest cached draw
    #[arg(short = 'f', long)]
    fill: bool,

    /// Fill everything from the first draw up to the active draw
    #[arg(short = 'b', long)]
    bootstrap: bool,

    /// Draw database path (overrides [store].path)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// API base URL (overrides [source].base_url)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Ids per backfill batch
    #[arg(long)]
    batch_size: Option<NonZeroUsize>,

    /// Concurrent fetches per batch
    #[arg(long)]
    workers: Option<NonZeroUsize>,

    /// Pause between backfill batches, in milliseconds
    #[arg(long)]
    cooldown_ms: Option<u64>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn mode_flags(&self) -> ModeFlags {
        ModeFlags {
            since: self.since,
            till: self.till,
            recent_days: self.recent,
            load: self.load,
            analyze: self.analyze,
            official_stats: self.official_stats,
            fill: self.fill,
            bootstrap: self.bootstrap,
        }
    }

    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(db) = &self.db {
            config.store.path = db.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.source.base_url = base_url.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.backfill.batch_size = batch_size;
        }
        if let Some(workers) = self.workers {
            config.backfill.workers = workers;
        }
        if let Some(cooldown_ms) = self.cooldown_ms {
            config.backfill.cooldown_ms = cooldown_ms;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let plan = match cli.mode_flags().into_plan(Local::now().date_naive()) {
        Ok(plan) => plan,
        Err(e) => Cli::command()
            .error(ErrorKind::MissingRequiredArgument, e)
            .exit(),
    };

    // .env is optional
    let _ = dotenvy::dotenv();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    init_logging(&config.log.level, cli.verbose);

    let store = SqliteDrawStore::open(&config.store.path)
        .with_context(|| format!("cannot open draw store {}", config.store.path.display()))?;
    let source = LotteryRestSource::new(&config.source)?;

    let app = App::new(Arc::new(source), Arc::new(store), config.backfill.clone());
    let mut stdout = std::io::stdout();
    let reports = app.execute(&plan, &mut stdout).await?;

    // Summaries go to stderr so stdout stays machine-readable.
    for report in &reports {
        eprintln!("{}", summarize(report));
    }

    Ok(())
}
