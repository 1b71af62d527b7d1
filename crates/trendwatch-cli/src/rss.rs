//! `rss` command handler.

use std::path::Path;

use anyhow::Context as _;
use chrono::Utc;
use trendwatch_analysis::{count_rss_frequency, filter_by_freshness, FrequencyOptions, RssRequest};
use trendwatch_core::{AppConfig, RssItem};

use crate::report::ReportContext;

fn read_items(path: &Path) -> anyhow::Result<Vec<RssItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read RSS items from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to decode RSS items from {}", path.display()))
}

/// Filter, match and group RSS items, printing the stats as JSON.
///
/// # Errors
///
/// Returns an error if configuration or any item file cannot be loaded.
pub(crate) fn run_rss(
    config: &AppConfig,
    items_path: &Path,
    new_items_path: Option<&Path>,
    seen_items_path: Option<&Path>,
    no_freshness: bool,
) -> anyhow::Result<()> {
    let ctx = ReportContext::load(config)?;
    let items = read_items(items_path)?;
    let new_items = new_items_path.map(read_items).transpose()?;
    let seen_items = seen_items_path.map(read_items).transpose()?;

    let (items, dropped) = if no_freshness {
        (items, 0)
    } else {
        filter_by_freshness(&items, &ctx.settings.rss, Utc::now())
    };

    let request = RssRequest {
        items: &items,
        word_groups: &ctx.keywords.groups,
        filter_words: &[],
        global_filters: &ctx.keywords.global_filters,
        new_items: new_items.as_deref(),
        seen_items: seen_items.as_deref(),
    };
    let options = FrequencyOptions {
        mode: ctx.settings.report.mode,
        rank_threshold: ctx.rank_threshold(config),
        weight: ctx.settings.weight,
        max_display: ctx.settings.report.max_news_per_keyword,
        sort_by_position_first: ctx.settings.report.sort_by_position_first,
        is_first_crawl: false,
    };
    let report = count_rss_frequency(&request, &options);

    let output = serde_json::json!({
        "total": report.total,
        "stale": dropped,
        "stats": report.stats,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
