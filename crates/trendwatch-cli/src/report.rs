//! `ingest` and `analyze` command handlers.
//!
//! Both build a filesystem store rooted at the configured data directory
//! and print the day's report as JSON on stdout.

use std::path::Path;

use anyhow::Context as _;
use chrono::{Local, NaiveDate, NaiveTime};
use trendwatch_analysis::{analyze_date, run_cycle, CycleOutcome, CycleRequest};
use trendwatch_core::{
    load_settings, load_word_groups, AppConfig, CrawlResults, ReportMode, Settings, WordGroupSpec,
};
use trendwatch_store::FsSnapshotStore;

/// Settings and keywords shared by the report commands.
pub(crate) struct ReportContext {
    pub(crate) settings: Settings,
    pub(crate) keywords: WordGroupSpec,
}

impl ReportContext {
    pub(crate) fn load(config: &AppConfig) -> anyhow::Result<Self> {
        let settings = load_settings(&config.settings_path).with_context(|| {
            format!("failed to load settings from {}", config.settings_path.display())
        })?;
        let keywords = load_word_groups(&config.keywords_path).with_context(|| {
            format!("failed to load keywords from {}", config.keywords_path.display())
        })?;
        if keywords.groups.is_empty() {
            tracing::warn!(
                path = %config.keywords_path.display(),
                "keyword file defines no groups, every title will be reported"
            );
        }
        Ok(Self { settings, keywords })
    }

    pub(crate) fn rank_threshold(&self, config: &AppConfig) -> u32 {
        config
            .rank_threshold_override
            .unwrap_or(self.settings.report.rank_threshold)
    }

    fn request(
        &self,
        config: &AppConfig,
        mode: Option<ReportMode>,
        by_source: bool,
    ) -> CycleRequest<'_> {
        let mut request = CycleRequest::from_settings(&self.keywords, &self.settings);
        request.rank_threshold = self.rank_threshold(config);
        request.by_source = by_source;
        if let Some(mode) = mode {
            request.mode = mode;
        }
        request
    }

    fn store(&self, config: &AppConfig) -> FsSnapshotStore {
        FsSnapshotStore::new(&config.data_dir)
            .with_text_snapshots(self.settings.storage.write_text_snapshots)
    }
}

fn print_outcome(outcome: &CycleOutcome) -> anyhow::Result<()> {
    match outcome {
        CycleOutcome::NoData => println!("no data available for this cycle"),
        CycleOutcome::Ready(report) => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

/// Ingest a crawl batch from `batch_path` and print the day's report.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the batch file
/// cannot be read or decoded, or the batch cannot be persisted.
pub(crate) fn run_ingest(
    config: &AppConfig,
    batch_path: &Path,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    by_source: bool,
) -> anyhow::Result<()> {
    let ctx = ReportContext::load(config)?;

    let raw = std::fs::read_to_string(batch_path)
        .with_context(|| format!("failed to read batch file {}", batch_path.display()))?;
    let mut results: CrawlResults = serde_json::from_str(&raw)
        .with_context(|| format!("failed to decode batch file {}", batch_path.display()))?;
    for (id, name) in ctx.settings.source_names() {
        results.source_names.entry(id).or_insert(name);
    }

    let now = Local::now().naive_local();
    let crawl_time = date
        .unwrap_or_else(|| now.date())
        .and_time(time.unwrap_or_else(|| now.time()));

    let batch = results.into_batch(crawl_time);
    tracing::info!(
        crawl_time = %crawl_time,
        sources = batch.per_source.len(),
        titles = batch.title_count(),
        failed = batch.failed_sources.len(),
        "ingesting batch"
    );

    let store = ctx.store(config);
    let outcome = run_cycle(&store, &batch, &ctx.request(config, None, by_source))?;
    print_outcome(&outcome)
}

/// Print the report for batches already stored under `date`.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the latest batch
/// for the date cannot be read.
pub(crate) fn run_analyze(
    config: &AppConfig,
    date: Option<NaiveDate>,
    mode: Option<ReportMode>,
    by_source: bool,
) -> anyhow::Result<()> {
    let ctx = ReportContext::load(config)?;
    let date = date.unwrap_or_else(|| Local::now().date_naive());

    let store = ctx.store(config);
    let outcome = analyze_date(&store, date, &ctx.request(config, mode, by_source))?;
    print_outcome(&outcome)
}
