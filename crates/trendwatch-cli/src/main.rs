use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use trendwatch_core::ReportMode;

mod report;
mod rss;
mod tools;

#[derive(Debug, Parser)]
#[command(name = "trendwatch")]
#[command(about = "Keyword trend tracking over ranked title lists")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Store one crawl batch and print the report for its day
    Ingest {
        /// JSON file with per-source titles, source names and failed sources
        #[arg(long)]
        batch: PathBuf,
        /// Calendar date of the crawl (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Wall-clock time of the crawl (defaults to now)
        #[arg(long)]
        time: Option<NaiveTime>,
        /// Also print the per-source view
        #[arg(long)]
        by_source: bool,
    },
    /// Re-analyze stored batches for a date
    Analyze {
        /// Date to analyze (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Override the report mode from the settings file
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Also print the per-source view
        #[arg(long)]
        by_source: bool,
    },
    /// Check a title against the keyword configuration
    Match { title: String },
    /// Print the canonical form of a URL
    Canon {
        url: String,
        /// Source id whose volatile parameters should be dropped
        #[arg(long)]
        source: Option<String>,
    },
    /// Aggregate a JSON list of RSS items by keyword
    Rss {
        /// JSON array of RSS items
        #[arg(long)]
        items: PathBuf,
        /// JSON array of items to flag as new
        #[arg(long)]
        new_items: Option<PathBuf>,
        /// JSON array of items from earlier runs; anything else is new
        #[arg(long)]
        seen_items: Option<PathBuf>,
        /// Keep stale items regardless of freshness settings
        #[arg(long)]
        no_freshness: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Daily,
    Current,
    Incremental,
}

impl From<ModeArg> for ReportMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Daily => ReportMode::Daily,
            ModeArg::Current => ReportMode::Current,
            ModeArg::Incremental => ReportMode::Incremental,
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = trendwatch_core::load_app_config()?;
    init_tracing(&config.log_level);
    tracing::debug!(env = %config.env, data_dir = %config.data_dir.display(), "configuration loaded");

    match cli.command {
        Some(Commands::Ingest {
            batch,
            date,
            time,
            by_source,
        }) => report::run_ingest(&config, &batch, date, time, by_source)?,
        Some(Commands::Analyze {
            date,
            mode,
            by_source,
        }) => report::run_analyze(&config, date, mode.map(ReportMode::from), by_source)?,
        Some(Commands::Match { title }) => tools::run_match(&config, &title)?,
        Some(Commands::Canon { url, source }) => tools::run_canon(&url, source.as_deref()),
        Some(Commands::Rss {
            items,
            new_items,
            seen_items,
            no_freshness,
        }) => rss::run_rss(
            &config,
            &items,
            new_items.as_deref(),
            seen_items.as_deref(),
            no_freshness,
        )?,
        None => println!("trendwatch: no command given, see --help"),
    }

    Ok(())
}
