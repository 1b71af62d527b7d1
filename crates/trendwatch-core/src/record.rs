use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Titles considered new per source id.
pub type NewTitles = BTreeMap<String, BTreeSet<String>>;

fn default_count() -> u32 {
    1
}

/// One title observed on one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleRecord {
    pub title: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "mobile_url")]
    pub mobile_url: String,
    /// Every observed rank in encounter order.
    #[serde(default)]
    pub ranks: Vec<u32>,
    #[serde(default = "default_count", alias = "count")]
    pub occurrence_count: u32,
    #[serde(default, alias = "first_time", skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<NaiveDateTime>,
    #[serde(default, alias = "last_time", skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<NaiveDateTime>,
    #[serde(default)]
    pub is_new: bool,
}

impl TitleRecord {
    #[must_use]
    pub fn new(source_id: &str, title: &str) -> Self {
        Self {
            title: title.to_string(),
            source_id: source_id.to_string(),
            source_name: String::new(),
            url: String::new(),
            mobile_url: String::new(),
            ranks: Vec::new(),
            occurrence_count: 1,
            first_seen: None,
            last_seen: None,
            is_new: false,
        }
    }

    /// Best (lowest) observed rank, if any.
    #[must_use]
    pub fn best_rank(&self) -> Option<u32> {
        self.ranks.iter().copied().min()
    }
}

/// One persisted capture of every source's title list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBatch {
    pub date: NaiveDate,
    pub crawl_time: NaiveDateTime,
    #[serde(default)]
    pub per_source: BTreeMap<String, Vec<TitleRecord>>,
    #[serde(default)]
    pub source_names: BTreeMap<String, String>,
    #[serde(default)]
    pub failed_sources: Vec<String>,
}

impl SnapshotBatch {
    #[must_use]
    pub fn empty(crawl_time: NaiveDateTime) -> Self {
        Self {
            date: crawl_time.date(),
            crawl_time,
            per_source: BTreeMap::new(),
            source_names: BTreeMap::new(),
            failed_sources: Vec::new(),
        }
    }

    /// Number of title records across all sources.
    #[must_use]
    pub fn title_count(&self) -> usize {
        self.per_source.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title_count() == 0
    }

    /// Display name for a source, falling back to its id.
    #[must_use]
    pub fn source_name<'a>(&'a self, source_id: &'a str) -> &'a str {
        self.source_names
            .get(source_id)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(source_id)
    }

    #[must_use]
    pub fn find(&self, source_id: &str, title: &str) -> Option<&TitleRecord> {
        self.per_source
            .get(source_id)?
            .iter()
            .find(|r| r.title == title)
    }
}

/// One RSS entry handed over by the feed collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RssItem {
    pub title: String,
    #[serde(default)]
    pub feed_id: String,
    #[serde(default)]
    pub feed_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub author: String,
    /// Publication timestamp as provided by the feed (RFC 3339, RFC 2822 or naive).
    #[serde(default)]
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<NaiveDateTime>,
    #[serde(default = "default_count")]
    pub count: u32,
}
