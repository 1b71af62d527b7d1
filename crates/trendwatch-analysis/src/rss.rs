//! Keyword aggregation and freshness filtering for RSS items.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use trendwatch_core::matcher::is_globally_filtered;
use trendwatch_core::settings::RssSettings;
use trendwatch_core::time_fmt::{format_published, is_within_days, parse_published};
use trendwatch_core::{url_signature, ReportMode, RssItem, WordGroup};

use crate::frequency::{catch_all_group, finish_stats};
use crate::types::{FrequencyOptions, FrequencyReport, TitleEntry, ALL_RSS_LABEL};

/// Inputs for [`count_rss_frequency`].
#[derive(Debug, Clone, Copy)]
pub struct RssRequest<'a> {
    pub items: &'a [RssItem],
    pub word_groups: &'a [WordGroup],
    pub filter_words: &'a [String],
    pub global_filters: &'a [String],
    /// Items to flag as new, compared by title and canonical URL.
    pub new_items: Option<&'a [RssItem]>,
    /// Items from earlier runs; anything not among them is new.
    pub seen_items: Option<&'a [RssItem]>,
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum DedupKey {
    Url(String),
    FeedTitle(String, String),
}

impl DedupKey {
    fn of(item: &RssItem) -> Self {
        if item.url.trim().is_empty() {
            Self::FeedTitle(item.feed_id.clone(), item.title.trim().to_string())
        } else {
            Self::Url(url_signature(&item.url, Some(&item.feed_id)))
        }
    }
}

fn identity(item: &RssItem) -> (String, String) {
    (
        item.title.trim().to_string(),
        url_signature(&item.url, Some(&item.feed_id)),
    )
}

/// Drop items older than their feed's freshness window.
///
/// Returns the kept items in input order and the number dropped. Items
/// without a parseable timestamp are kept.
#[must_use]
pub fn filter_by_freshness(
    items: &[RssItem],
    settings: &RssSettings,
    now: DateTime<Utc>,
) -> (Vec<RssItem>, usize) {
    let (kept, dropped): (Vec<&RssItem>, Vec<&RssItem>) = items.iter().partition(|item| {
        let max_days = settings.max_age_days_for(&item.feed_id);
        is_within_days(&item.published_at, i64::from(max_days), now)
    });

    if !dropped.is_empty() {
        tracing::info!(
            kept = kept.len(),
            dropped = dropped.len(),
            "filtered stale RSS items"
        );
    }
    (kept.into_iter().cloned().collect(), dropped.len())
}

/// Match and group RSS items by keyword.
///
/// Items sharing a canonical URL count once (first wins); items without a
/// URL dedup on feed and title. `total` is the raw input length. With no
/// word groups a catch-all group labelled [`ALL_RSS_LABEL`] receives every
/// item. An item is new when it is listed in `new_items` or missing from
/// `seen_items`. In incremental mode only new items take part, once either
/// list is supplied.
#[must_use]
pub fn count_rss_frequency(
    request: &RssRequest<'_>,
    options: &FrequencyOptions,
) -> FrequencyReport {
    let total = request.items.len();
    if total == 0 {
        return FrequencyReport {
            stats: Vec::new(),
            total,
        };
    }

    let catch_all = request.word_groups.is_empty();
    let fallback;
    let groups: &[WordGroup] = if catch_all {
        tracing::info!("keyword config is empty, reporting every RSS item");
        fallback = [catch_all_group(ALL_RSS_LABEL)];
        &fallback
    } else {
        request.word_groups
    };

    let identities = |items: &[RssItem]| -> HashSet<(String, String)> {
        items.iter().map(identity).collect()
    };
    let new_items = request.new_items.map(identities);
    let seen_items = request.seen_items.map(identities);
    let only_new = options.mode == ReportMode::Incremental
        && (new_items.is_some() || seen_items.is_some());

    let mut seen = HashSet::new();
    let mut buckets: Vec<Vec<TitleEntry>> = vec![Vec::new(); groups.len()];
    let mut duplicates = 0usize;

    for item in request.items {
        if !seen.insert(DedupKey::of(item)) {
            duplicates += 1;
            continue;
        }

        let id = identity(item);
        let is_new = new_items.as_ref().is_some_and(|set| set.contains(&id))
            || seen_items.as_ref().is_some_and(|set| !set.contains(&id));
        if only_new && !is_new {
            continue;
        }

        let title_lower = item.title.trim().to_lowercase();
        if !catch_all
            && (title_lower.is_empty() || is_globally_filtered(&title_lower, request.global_filters))
        {
            continue;
        }

        for (bucket, group) in buckets.iter_mut().zip(groups) {
            if catch_all || group.matches_lowered(&title_lower, request.filter_words) {
                bucket.push(rss_entry(item, is_new));
            }
        }
    }

    let stats = finish_stats(groups, buckets, total, options, newest_first);
    tracing::debug!(total, duplicates, groups = stats.len(), "aggregated RSS items");
    FrequencyReport { stats, total }
}

fn rss_entry(item: &RssItem, is_new: bool) -> TitleEntry {
    let source_name = if item.feed_name.is_empty() {
        item.feed_id.clone()
    } else {
        item.feed_name.clone()
    };
    TitleEntry {
        title: item.title.trim().to_string(),
        source_id: item.feed_id.clone(),
        source_name,
        url: item.url.clone(),
        mobile_url: String::new(),
        ranks: Vec::new(),
        count: item.count,
        first_seen: item.first_seen,
        last_seen: item.last_seen,
        time_display: format_published(&item.published_at),
        published_at: item.published_at.clone(),
        is_new,
        matched_keyword: None,
        weight: 0.0,
    }
}

/// Publication time descending; undated items last.
fn newest_first(a: &TitleEntry, b: &TitleEntry) -> Ordering {
    match (parse_published(&a.published_at), parse_published(&b.published_at)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
