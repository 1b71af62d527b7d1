//! Building [`SnapshotBatch`]es from raw crawl output.
//!
//! The fetch collaborator reports each title either as a detail mapping
//! (`{ranks, url, mobileUrl}`) or, in older output, as a bare rank list.
//! Both shapes are decoded here so nothing downstream branches on them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::record::{SnapshotBatch, TitleRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleDetail {
    #[serde(default)]
    pub ranks: Vec<u32>,
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "mobile_url")]
    pub mobile_url: String,
}

/// Stored information about one title, in either historical shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TitleInfo {
    Ranks(Vec<u32>),
    Detail(TitleDetail),
}

impl TitleInfo {
    #[must_use]
    pub fn into_detail(self) -> TitleDetail {
        match self {
            TitleInfo::Ranks(ranks) => TitleDetail {
                ranks,
                ..TitleDetail::default()
            },
            TitleInfo::Detail(detail) => detail,
        }
    }
}

/// Raw output of one crawl cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResults {
    #[serde(default)]
    pub sources: BTreeMap<String, BTreeMap<String, TitleInfo>>,
    #[serde(default, alias = "id_to_name")]
    pub source_names: BTreeMap<String, String>,
    #[serde(default, alias = "failed_ids")]
    pub failed_sources: Vec<String>,
}

impl CrawlResults {
    /// Convert into a batch captured at `crawl_time`.
    ///
    /// Failed sources are excluded. Titles within a source are ordered by
    /// best rank, then by title.
    #[must_use]
    pub fn into_batch(self, crawl_time: NaiveDateTime) -> SnapshotBatch {
        let mut builder = BatchBuilder::new(crawl_time);
        for (id, name) in &self.source_names {
            builder.source_name(id, name);
        }
        for id in &self.failed_sources {
            builder.mark_failed(id);
        }

        for (source_id, titles) in self.sources {
            let mut entries: Vec<(String, TitleDetail)> = titles
                .into_iter()
                .map(|(title, info)| (title, info.into_detail()))
                .collect();
            entries.sort_by(|(a_title, a), (b_title, b)| {
                let a_best = a.ranks.iter().min().copied().unwrap_or(u32::MAX);
                let b_best = b.ranks.iter().min().copied().unwrap_or(u32::MAX);
                a_best.cmp(&b_best).then_with(|| a_title.cmp(b_title))
            });
            for (title, detail) in entries {
                builder.observe_ranks(
                    &source_id,
                    &title,
                    &detail.ranks,
                    &detail.url,
                    &detail.mobile_url,
                );
            }
        }

        builder.build()
    }
}

/// Accumulates one crawl's observations into a [`SnapshotBatch`].
///
/// Repeated sightings of the same title on the same source collapse into a
/// single record whose ranks keep encounter order.
#[derive(Debug)]
pub struct BatchBuilder {
    crawl_time: NaiveDateTime,
    per_source: BTreeMap<String, Vec<TitleRecord>>,
    index: HashMap<(String, String), usize>,
    source_names: BTreeMap<String, String>,
    failed: BTreeSet<String>,
}

impl BatchBuilder {
    #[must_use]
    pub fn new(crawl_time: NaiveDateTime) -> Self {
        Self {
            crawl_time,
            per_source: BTreeMap::new(),
            index: HashMap::new(),
            source_names: BTreeMap::new(),
            failed: BTreeSet::new(),
        }
    }

    pub fn source_name(&mut self, source_id: &str, name: &str) -> &mut Self {
        self.source_names
            .insert(source_id.to_string(), name.to_string());
        self
    }

    pub fn mark_failed(&mut self, source_id: &str) -> &mut Self {
        self.failed.insert(source_id.to_string());
        self
    }

    /// Record one sighting of `title` at `rank`.
    pub fn observe(
        &mut self,
        source_id: &str,
        title: &str,
        rank: u32,
        url: &str,
        mobile_url: &str,
    ) -> &mut Self {
        self.observe_ranks(source_id, title, &[rank], url, mobile_url)
    }

    /// Record a title seen at several ranks (or none).
    pub fn observe_ranks(
        &mut self,
        source_id: &str,
        title: &str,
        ranks: &[u32],
        url: &str,
        mobile_url: &str,
    ) -> &mut Self {
        let title = title.trim();
        if title.is_empty() {
            tracing::debug!(source = source_id, "skipping blank title");
            return self;
        }

        let key = (source_id.to_string(), title.to_string());
        let records = self.per_source.entry(source_id.to_string()).or_default();

        if let Some(&pos) = self.index.get(&key) {
            let record = &mut records[pos];
            record.ranks.extend_from_slice(ranks);
            record.occurrence_count = observed_count(&record.ranks);
            if record.url.is_empty() {
                record.url = url.to_string();
            }
            if record.mobile_url.is_empty() {
                record.mobile_url = mobile_url.to_string();
            }
        } else {
            let mut record = TitleRecord::new(source_id, title);
            record.url = url.to_string();
            record.mobile_url = mobile_url.to_string();
            record.ranks = ranks.to_vec();
            record.occurrence_count = observed_count(&record.ranks);
            record.first_seen = Some(self.crawl_time);
            record.last_seen = Some(self.crawl_time);
            self.index.insert(key, records.len());
            records.push(record);
        }

        self
    }

    #[must_use]
    pub fn build(self) -> SnapshotBatch {
        let BatchBuilder {
            crawl_time,
            mut per_source,
            source_names,
            failed,
            ..
        } = self;

        per_source.retain(|id, _| !failed.contains(id));
        for (id, records) in &mut per_source {
            let name = source_names
                .get(id)
                .filter(|n| !n.is_empty())
                .cloned()
                .unwrap_or_else(|| id.clone());
            for record in records {
                record.source_name.clone_from(&name);
            }
        }

        SnapshotBatch {
            date: crawl_time.date(),
            crawl_time,
            per_source,
            source_names,
            failed_sources: failed.into_iter().collect(),
        }
    }
}

/// A title present in a batch was seen at least once, ranked or not.
fn observed_count(ranks: &[u32]) -> u32 {
    u32::try_from(ranks.len()).unwrap_or(u32::MAX).max(1)
}

/// Merge records that share a title, keeping first-seen order.
///
/// Ranks are concatenated, counts summed, and the first non-empty URLs
/// kept. Timestamps widen to cover both records.
#[must_use]
pub fn collapse_duplicates(records: &[TitleRecord]) -> Vec<TitleRecord> {
    let mut merged: Vec<TitleRecord> = Vec::with_capacity(records.len());
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for record in records {
        if let Some(&pos) = positions.get(record.title.as_str()) {
            let target = &mut merged[pos];
            target.ranks.extend_from_slice(&record.ranks);
            target.occurrence_count = target
                .occurrence_count
                .saturating_add(record.occurrence_count);
            if target.url.is_empty() {
                target.url.clone_from(&record.url);
            }
            if target.mobile_url.is_empty() {
                target.mobile_url.clone_from(&record.mobile_url);
            }
            target.first_seen = min_opt(target.first_seen, record.first_seen);
            target.last_seen = target.last_seen.max(record.last_seen);
            target.is_new |= record.is_new;
        } else {
            positions.insert(record.title.as_str(), merged.len());
            merged.push(record.clone());
        }
    }

    merged
}

fn min_opt(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn crawl_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn duplicate_titles_collapse_with_ranks_in_order() {
        let mut builder = BatchBuilder::new(crawl_time());
        builder
            .observe("weibo", "Same title", 1, "https://a.test/1", "")
            .observe("weibo", "Other title", 3, "", "")
            .observe("weibo", "Same title", 2, "https://a.test/2", "https://m.a.test/2");
        let batch = builder.build();

        let records = &batch.per_source["weibo"];
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Same title");
        assert_eq!(records[0].ranks, vec![1, 2]);
        assert_eq!(records[0].occurrence_count, 2);
        assert_eq!(records[0].url, "https://a.test/1");
        assert_eq!(records[0].mobile_url, "https://m.a.test/2");
        assert_eq!(records[0].first_seen, Some(crawl_time()));
        assert_eq!(records[0].last_seen, Some(crawl_time()));
    }

    #[test]
    fn same_title_on_different_sources_stays_separate() {
        let mut builder = BatchBuilder::new(crawl_time());
        builder.observe("a", "Title", 1, "", "").observe("b", "Title", 4, "", "");
        let batch = builder.build();
        assert_eq!(batch.per_source["a"][0].ranks, vec![1]);
        assert_eq!(batch.per_source["b"][0].ranks, vec![4]);
    }

    #[test]
    fn blank_titles_are_skipped_and_titles_trimmed() {
        let mut builder = BatchBuilder::new(crawl_time());
        builder
            .observe("a", "   ", 1, "", "")
            .observe("a", "  Padded  ", 2, "", "");
        let batch = builder.build();
        assert_eq!(batch.per_source["a"].len(), 1);
        assert_eq!(batch.per_source["a"][0].title, "Padded");
    }

    #[test]
    fn failed_sources_are_excluded() {
        let mut builder = BatchBuilder::new(crawl_time());
        builder
            .source_name("a", "Alpha")
            .observe("a", "T1", 1, "", "")
            .observe("b", "T2", 1, "", "")
            .mark_failed("b");
        let batch = builder.build();
        assert!(batch.per_source.contains_key("a"));
        assert!(!batch.per_source.contains_key("b"));
        assert_eq!(batch.failed_sources, vec!["b".to_string()]);
        assert_eq!(batch.per_source["a"][0].source_name, "Alpha");
        assert_eq!(batch.date, crawl_time().date());
    }

    #[test]
    fn title_info_decodes_both_shapes() {
        let json = r#"{
            "sources": {
                "weibo": {
                    "Legacy title": [3, 5],
                    "Detailed title": {"ranks": [1], "url": "https://a.test", "mobileUrl": "https://m.a.test"}
                },
                "zhihu": {"Failed": [1]}
            },
            "sourceNames": {"weibo": "Weibo"},
            "failedSources": ["zhihu"]
        }"#;
        let results: CrawlResults = serde_json::from_str(json).unwrap();
        let batch = results.into_batch(crawl_time());

        let records = &batch.per_source["weibo"];
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Detailed title");
        assert_eq!(records[0].url, "https://a.test");
        assert_eq!(records[0].mobile_url, "https://m.a.test");
        assert_eq!(records[1].title, "Legacy title");
        assert_eq!(records[1].ranks, vec![3, 5]);
        assert_eq!(records[1].occurrence_count, 2);
        assert_eq!(records[1].url, "");
        assert!(!batch.per_source.contains_key("zhihu"));
        assert_eq!(batch.source_name("weibo"), "Weibo");
    }

    #[test]
    fn unranked_title_counts_once() {
        let results: CrawlResults =
            serde_json::from_str(r#"{"sources": {"a": {"No rank": {"url": "u"}}}}"#).unwrap();
        let batch = results.into_batch(crawl_time());
        let record = &batch.per_source["a"][0];
        assert!(record.ranks.is_empty());
        assert_eq!(record.occurrence_count, 1);
    }

    #[test]
    fn collapse_duplicates_merges_by_title() {
        let mut first = TitleRecord::new("a", "Dup");
        first.ranks = vec![1];
        let mut second = TitleRecord::new("a", "Dup");
        second.ranks = vec![2];
        second.url = "https://x.test".to_string();
        let other = TitleRecord::new("a", "Other");

        let merged = collapse_duplicates(&[first, other, second]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].ranks, vec![1, 2]);
        assert_eq!(merged[0].occurrence_count, 2);
        assert_eq!(merged[0].url, "https://x.test");
        assert_eq!(merged[1].title, "Other");
    }
}
