//! Keyword-centric aggregation of news titles.
//!
//! Every `(source, title)` pair is matched against the configured word
//! groups, scored, and collected under each group it satisfies. The report
//! mode decides which titles take part and which count as new.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use trendwatch_core::matcher::is_globally_filtered;
use trendwatch_core::time_fmt::format_time_display;
use trendwatch_core::{
    calculate_weight, collapse_duplicates, NewTitles, ReportMode, SnapshotBatch, TitleRecord,
    WordGroup,
};

use crate::types::{
    FrequencyOptions, FrequencyReport, FrequencyRequest, KeywordStat, TitleEntry, ALL_NEWS_LABEL,
};

// ---------------------------------------------------------------------------
// Title selection per report mode
// ---------------------------------------------------------------------------

/// Which titles a run processes, and how their `is_new` flag is decided.
enum Selection<'a> {
    /// Every title; new when listed in `new_titles`.
    All(Option<&'a NewTitles>),
    /// Titles still listed at the day's latest crawl.
    StillListed {
        history: &'a SnapshotBatch,
        latest: NaiveDateTime,
        new_titles: Option<&'a NewTitles>,
    },
    /// Every title, all of them new.
    AllNew,
    /// Only titles listed in `new_titles`.
    OnlyNew(Option<&'a NewTitles>),
}

impl<'a> Selection<'a> {
    fn for_request(request: &FrequencyRequest<'a>, options: &FrequencyOptions) -> Self {
        match options.mode {
            ReportMode::Daily => Self::All(request.new_titles),
            ReportMode::Current => {
                let latest = request.history.and_then(|history| {
                    history
                        .per_source
                        .values()
                        .flatten()
                        .filter_map(|r| r.last_seen)
                        .max()
                        .map(|latest| (history, latest))
                });
                match latest {
                    Some((history, latest)) => Self::StillListed {
                        history,
                        latest,
                        new_titles: request.new_titles,
                    },
                    None => Self::All(request.new_titles),
                }
            }
            ReportMode::Incremental if options.is_first_crawl => {
                tracing::info!("incremental mode: first crawl of the day, every title is new");
                Self::AllNew
            }
            ReportMode::Incremental => Self::OnlyNew(request.new_titles),
        }
    }

    /// `Some(is_new)` when the title takes part in this run.
    fn admit(&self, source_id: &str, title: &str) -> Option<bool> {
        let listed = |new_titles: Option<&NewTitles>| {
            new_titles
                .and_then(|n| n.get(source_id))
                .is_some_and(|titles| titles.contains(title))
        };

        match self {
            Self::All(new_titles) => Some(listed(*new_titles)),
            Self::StillListed {
                history,
                latest,
                new_titles,
            } => {
                let still_listed = history
                    .find(source_id, title)
                    .is_some_and(|r| r.last_seen == Some(*latest));
                still_listed.then(|| listed(*new_titles))
            }
            Self::AllNew => Some(true),
            Self::OnlyNew(new_titles) => listed(*new_titles).then_some(true),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Match, score, and group news titles by keyword.
///
/// `total` counts distinct titles per source in `results` and does not
/// depend on matching or report mode. Groups that matched nothing are left
/// out. With no word groups configured a single catch-all group labelled
/// [`ALL_NEWS_LABEL`] receives every title.
#[must_use]
pub fn count_word_frequency(
    request: &FrequencyRequest<'_>,
    options: &FrequencyOptions,
) -> FrequencyReport {
    let collapsed: Vec<(&String, Vec<TitleRecord>)> = request
        .results
        .iter()
        .map(|(source_id, records)| (source_id, collapse_duplicates(records)))
        .collect();
    let total: usize = collapsed.iter().map(|(_, records)| records.len()).sum();

    let catch_all = request.word_groups.is_empty();
    let fallback;
    let groups: &[WordGroup] = if catch_all {
        tracing::info!("keyword config is empty, reporting every title");
        fallback = [catch_all_group(ALL_NEWS_LABEL)];
        &fallback
    } else {
        request.word_groups
    };

    let selection = Selection::for_request(request, options);
    let mut buckets: Vec<Vec<TitleEntry>> = vec![Vec::new(); groups.len()];
    let mut processed = 0usize;

    for (source_id, records) in &collapsed {
        let source_name = display_name(request, source_id);
        for record in records {
            let Some(is_new) = selection.admit(source_id, &record.title) else {
                continue;
            };
            processed += 1;

            let title_lower = record.title.trim().to_lowercase();
            if !catch_all
                && (title_lower.is_empty()
                    || is_globally_filtered(&title_lower, request.global_filters))
            {
                continue;
            }

            let history = request
                .history
                .and_then(|h| h.find(source_id, &record.title));

            for (bucket, group) in buckets.iter_mut().zip(groups) {
                if catch_all || group.matches_lowered(&title_lower, request.filter_words) {
                    bucket.push(news_entry(
                        source_id,
                        source_name,
                        record,
                        history,
                        is_new,
                        options,
                    ));
                }
            }
        }
    }

    let stats = finish_stats(groups, buckets, total, options, sort_by_weight);
    tracing::debug!(
        mode = %options.mode,
        total,
        processed,
        groups = stats.len(),
        "aggregated news titles"
    );
    FrequencyReport { stats, total }
}

fn display_name<'a>(request: &FrequencyRequest<'a>, source_id: &'a str) -> &'a str {
    request
        .source_names
        .get(source_id)
        .map(String::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(source_id)
}

/// Build the report entry, preferring the day's history for count, ranks,
/// and time span.
fn news_entry(
    source_id: &str,
    source_name: &str,
    record: &TitleRecord,
    history: Option<&TitleRecord>,
    is_new: bool,
    options: &FrequencyOptions,
) -> TitleEntry {
    let (ranks, count, first_seen, last_seen) = match history {
        Some(h) if !h.ranks.is_empty() => (
            h.ranks.clone(),
            h.occurrence_count,
            h.first_seen,
            h.last_seen,
        ),
        Some(h) => (
            record.ranks.clone(),
            h.occurrence_count,
            h.first_seen,
            h.last_seen,
        ),
        None => (
            record.ranks.clone(),
            record.occurrence_count,
            record.first_seen,
            record.last_seen,
        ),
    };

    let pick = |current: &str, stored: Option<&str>| {
        if current.is_empty() {
            stored.unwrap_or_default().to_string()
        } else {
            current.to_string()
        }
    };

    let weight = calculate_weight(&ranks, Some(count), options.rank_threshold, &options.weight);
    TitleEntry {
        title: record.title.clone(),
        source_id: source_id.to_string(),
        source_name: source_name.to_string(),
        url: pick(&record.url, history.map(|h| h.url.as_str())),
        mobile_url: pick(&record.mobile_url, history.map(|h| h.mobile_url.as_str())),
        ranks,
        count,
        first_seen,
        last_seen,
        time_display: format_time_display(first_seen, last_seen),
        published_at: String::new(),
        is_new,
        matched_keyword: None,
        weight,
    }
}

// ---------------------------------------------------------------------------
// Shared with the RSS aggregator
// ---------------------------------------------------------------------------

pub(crate) fn catch_all_group(label: &str) -> WordGroup {
    WordGroup {
        group_key: label.to_string(),
        ..WordGroup::default()
    }
}

/// Smallest non-zero cap among the group's and the global one.
pub(crate) fn display_cap(group_max: usize, global_max: usize) -> Option<usize> {
    [group_max, global_max].into_iter().filter(|&n| n > 0).min()
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Weight descending, then best rank, then count descending.
pub(crate) fn sort_by_weight(a: &TitleEntry, b: &TitleEntry) -> Ordering {
    let best = |e: &TitleEntry| e.ranks.iter().copied().min().unwrap_or(u32::MAX);
    b.weight
        .total_cmp(&a.weight)
        .then_with(|| best(a).cmp(&best(b)))
        .then_with(|| b.count.cmp(&a.count))
}

/// Turn per-group buckets into ordered, capped stats.
pub(crate) fn finish_stats(
    groups: &[WordGroup],
    buckets: Vec<Vec<TitleEntry>>,
    total: usize,
    options: &FrequencyOptions,
    order: fn(&TitleEntry, &TitleEntry) -> Ordering,
) -> Vec<KeywordStat> {
    let mut stats: Vec<KeywordStat> = groups
        .iter()
        .zip(buckets)
        .filter(|(_, titles)| !titles.is_empty())
        .map(|(group, mut titles)| {
            titles.sort_by(order);
            let count = titles.len();
            if let Some(cap) = display_cap(group.max_display, options.max_display) {
                titles.truncate(cap);
            }
            KeywordStat {
                group_key: group.group_key.clone(),
                count,
                titles,
                percentage: percentage(count, total),
                position: group.position,
            }
        })
        .collect();

    if options.sort_by_position_first {
        stats.sort_by(|a, b| a.position.cmp(&b.position).then(b.count.cmp(&a.count)));
    } else {
        stats.sort_by(|a, b| b.count.cmp(&a.count).then(a.position.cmp(&b.position)));
    }
    stats
}

#[cfg(test)]
#[path = "frequency_test.rs"]
mod tests;
