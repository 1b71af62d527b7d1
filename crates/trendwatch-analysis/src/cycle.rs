//! One crawl cycle end to end: persist, diff, aggregate, pivot.
//!
//! Store reads after the save degrade to "no history" so a damaged day
//! directory never blocks a report.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use trendwatch_core::{NewTitles, ReportMode, Settings, SnapshotBatch, WeightConfig, WordGroupSpec};
use trendwatch_store::{detect_new_titles, is_first_crawl_today, load_history, SnapshotStore};

use crate::frequency::count_word_frequency;
use crate::pivot::to_platform_stats;
use crate::types::{FrequencyOptions, FrequencyRequest, KeywordStat, PlatformStat};
use crate::AnalysisError;

/// Everything a cycle needs besides the store and the batch.
#[derive(Debug, Clone)]
pub struct CycleRequest<'a> {
    pub keywords: &'a WordGroupSpec,
    pub mode: ReportMode,
    pub rank_threshold: u32,
    pub weight: WeightConfig,
    /// Global per-group display cap; `0` means unlimited.
    pub max_display: usize,
    pub sort_by_position_first: bool,
    /// Also produce the source-centric view.
    pub by_source: bool,
}

impl<'a> CycleRequest<'a> {
    /// Request shaped by the report section of `settings`.
    #[must_use]
    pub fn from_settings(keywords: &'a WordGroupSpec, settings: &Settings) -> Self {
        Self {
            keywords,
            mode: settings.report.mode,
            rank_threshold: settings.report.rank_threshold,
            weight: settings.weight,
            max_display: settings.report.max_news_per_keyword,
            sort_by_position_first: settings.report.sort_by_position_first,
            by_source: false,
        }
    }

    fn options(&self, is_first_crawl: bool) -> FrequencyOptions {
        FrequencyOptions {
            mode: self.mode,
            rank_threshold: self.rank_threshold,
            weight: self.weight,
            max_display: self.max_display,
            sort_by_position_first: self.sort_by_position_first,
            is_first_crawl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub date: NaiveDate,
    pub crawl_time: NaiveDateTime,
    pub mode: ReportMode,
    pub is_first_crawl: bool,
    pub total: usize,
    pub stats: Vec<KeywordStat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_stats: Option<Vec<PlatformStat>>,
    pub new_titles: NewTitles,
    pub failed_sources: Vec<String>,
}

/// Result of a cycle. Callers must check for [`CycleOutcome::NoData`]
/// before reporting or notifying.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    NoData,
    Ready(CycleReport),
}

/// Persist `batch`, then report on the day it belongs to.
///
/// # Errors
///
/// Returns [`AnalysisError::Store`] if the batch cannot be saved. Later
/// reads fall back to first-crawl semantics instead of failing.
pub fn run_cycle<S: SnapshotStore + ?Sized>(
    store: &S,
    batch: &SnapshotBatch,
    request: &CycleRequest<'_>,
) -> Result<CycleOutcome, AnalysisError> {
    store.save_batch(batch)?;

    let (history, is_first_crawl) = day_state(store, batch.date);
    Ok(build_report(batch, history.as_ref(), is_first_crawl, request))
}

/// Report on data already stored for `date` without ingesting anything.
///
/// # Errors
///
/// Returns [`AnalysisError::Store`] if the latest batch cannot be read.
pub fn analyze_date<S: SnapshotStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    request: &CycleRequest<'_>,
) -> Result<CycleOutcome, AnalysisError> {
    let Some(latest) = store.latest_batch_for_date(date)? else {
        tracing::info!(date = %date, "no batches stored for date");
        return Ok(CycleOutcome::NoData);
    };

    let (history, is_first_crawl) = day_state(store, date);
    Ok(build_report(&latest, history.as_ref(), is_first_crawl, request))
}

/// History for `date` plus whether the cycle counts as the day's first.
///
/// At least one batch is stored whenever this runs, so missing history means
/// the day could not be read and the cycle falls back to first-crawl rules.
fn day_state<S: SnapshotStore + ?Sized>(
    store: &S,
    date: NaiveDate,
) -> (Option<SnapshotBatch>, bool) {
    let history = load_history(store, date);
    let is_first_crawl = history.is_none() || is_first_crawl_today(store, date);
    (history, is_first_crawl)
}

fn build_report(
    latest: &SnapshotBatch,
    history: Option<&SnapshotBatch>,
    is_first_crawl: bool,
    request: &CycleRequest<'_>,
) -> CycleOutcome {
    if latest.is_empty() && history.is_none_or(SnapshotBatch::is_empty) {
        tracing::info!(date = %latest.date, "no titles available for this cycle");
        return CycleOutcome::NoData;
    }

    let new_titles = if is_first_crawl {
        NewTitles::new()
    } else {
        detect_new_titles(Some(latest), history)
    };

    let results = match (request.mode, history) {
        (ReportMode::Incremental, _) | (_, None) => &latest.per_source,
        (_, Some(history)) => &history.per_source,
    };

    let mut source_names: BTreeMap<String, String> =
        history.map(|h| h.source_names.clone()).unwrap_or_default();
    source_names.extend(
        latest
            .source_names
            .iter()
            .map(|(id, name)| (id.clone(), name.clone())),
    );

    let frequency_request = FrequencyRequest {
        results,
        source_names: &source_names,
        word_groups: &request.keywords.groups,
        filter_words: &[],
        global_filters: &request.keywords.global_filters,
        history,
        new_titles: Some(&new_titles),
    };
    let report = count_word_frequency(&frequency_request, &request.options(is_first_crawl));

    let platform_stats = request
        .by_source
        .then(|| to_platform_stats(&report.stats, &request.weight, request.rank_threshold));

    let new_count: usize = new_titles.values().map(BTreeSet::len).sum();
    tracing::info!(
        date = %latest.date,
        mode = %request.mode,
        total = report.total,
        groups = report.stats.len(),
        new_titles = new_count,
        first_crawl = is_first_crawl,
        "cycle report ready"
    );

    CycleOutcome::Ready(CycleReport {
        date: latest.date,
        crawl_time: latest.crawl_time,
        mode: request.mode,
        is_first_crawl,
        total: report.total,
        stats: report.stats,
        platform_stats,
        new_titles,
        failed_sources: latest.failed_sources.clone(),
    })
}
