use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use trendwatch_core::{NewTitles, ReportMode, SnapshotBatch, TitleRecord, WeightConfig, WordGroup};

/// Label of the synthetic group used when no keyword groups are configured.
pub const ALL_NEWS_LABEL: &str = "all news";
/// RSS counterpart of [`ALL_NEWS_LABEL`].
pub const ALL_RSS_LABEL: &str = "all RSS";

/// One matched title as it appears in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleEntry {
    pub title: String,
    pub source_id: String,
    pub source_name: String,
    pub url: String,
    pub mobile_url: String,
    pub ranks: Vec<u32>,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<NaiveDateTime>,
    /// `"[08:00 ~ 10:30]"` style span for news, `MM-DD HH:MM` for RSS.
    pub time_display: String,
    /// Raw feed timestamp; empty for news titles.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub published_at: String,
    pub is_new: bool,
    /// Group key that matched this title; set in source-centric views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
    pub weight: f64,
}

/// Keyword-centric statistics for one word group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordStat {
    pub group_key: String,
    /// Distinct `(source, title)` pairs matched, before any display cap.
    pub count: usize,
    pub titles: Vec<TitleEntry>,
    pub percentage: f64,
    pub position: usize,
}

/// Source-centric statistics built from [`KeywordStat`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStat {
    pub source_name: String,
    pub count: usize,
    pub titles: Vec<TitleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyReport {
    pub stats: Vec<KeywordStat>,
    /// Input titles before any matching or filtering.
    pub total: usize,
}

/// Knobs that shape a frequency report.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyOptions {
    pub mode: ReportMode,
    pub rank_threshold: u32,
    pub weight: WeightConfig,
    /// Cap on titles per group across all groups; `0` means unlimited.
    pub max_display: usize,
    pub sort_by_position_first: bool,
    /// Whether the batch being reported is the day's first.
    pub is_first_crawl: bool,
}

impl Default for FrequencyOptions {
    fn default() -> Self {
        Self {
            mode: ReportMode::Daily,
            rank_threshold: 5,
            weight: WeightConfig::default(),
            max_display: 0,
            sort_by_position_first: false,
            is_first_crawl: false,
        }
    }
}

/// Inputs for [`crate::count_word_frequency`].
#[derive(Debug, Clone, Copy)]
pub struct FrequencyRequest<'a> {
    pub results: &'a BTreeMap<String, Vec<TitleRecord>>,
    pub source_names: &'a BTreeMap<String, String>,
    pub word_groups: &'a [WordGroup],
    /// Applied to every group on top of each group's own filters.
    pub filter_words: &'a [String],
    pub global_filters: &'a [String],
    /// The day's accumulated state, used for counts and time spans.
    pub history: Option<&'a SnapshotBatch>,
    pub new_titles: Option<&'a NewTitles>,
}
