//! Keyword trend analysis over stored snapshot batches.
//!
//! Matches titles against word groups, scores them, and groups the result
//! by keyword (and optionally by source). [`run_cycle`] drives one crawl
//! cycle against an injected [`trendwatch_store::SnapshotStore`].

pub mod cycle;
pub mod frequency;
pub mod pivot;
pub mod rss;
pub mod types;

use thiserror::Error;
use trendwatch_store::StoreError;

pub use cycle::{analyze_date, run_cycle, CycleOutcome, CycleReport, CycleRequest};
pub use frequency::count_word_frequency;
pub use pivot::to_platform_stats;
pub use rss::{count_rss_frequency, filter_by_freshness, RssRequest};
pub use types::{
    FrequencyOptions, FrequencyReport, FrequencyRequest, KeywordStat, PlatformStat, TitleEntry,
    ALL_NEWS_LABEL, ALL_RSS_LABEL,
};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("snapshot store error: {0}")]
    Store(#[from] StoreError),
}
