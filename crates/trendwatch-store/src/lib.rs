//! Dated snapshot persistence and day-scoped diffing.
//!
//! A [`SnapshotStore`] persists whole [`SnapshotBatch`]es and answers
//! date-scoped queries. Implementations are handed to callers explicitly;
//! there is no process-wide store.

pub mod accumulate;
pub mod differ;
pub mod fs;
pub mod memory;
pub mod text;

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;
use trendwatch_core::SnapshotBatch;

pub use accumulate::accumulate_batches;
pub use differ::{
    detect_new_titles, detect_new_titles_for_date, is_first_crawl_today, load_history,
};
pub use fs::FsSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use text::render_text_snapshot;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode batch {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("snapshot store lock poisoned")]
    Poisoned,
}

/// Whole-batch persistence scoped by calendar date.
///
/// Writes must be atomic at batch granularity so a concurrent reader never
/// sees a half-written batch.
pub trait SnapshotStore {
    /// Persist one batch under its own date.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the batch cannot be encoded or written.
    fn save_batch(&self, batch: &SnapshotBatch) -> Result<(), StoreError>;

    /// Every batch recorded for `date`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if stored batches cannot be read or decoded.
    fn batches_for_date(&self, date: NaiveDate) -> Result<Vec<SnapshotBatch>, StoreError>;

    /// Number of batches recorded for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be listed.
    fn count_batches_for_date(&self, date: NaiveDate) -> Result<usize, StoreError>;

    /// The most recent batch for `date`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if stored batches cannot be read or decoded.
    fn latest_batch_for_date(&self, date: NaiveDate) -> Result<Option<SnapshotBatch>, StoreError> {
        Ok(self.batches_for_date(date)?.pop())
    }

    /// The union of every batch recorded for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if stored batches cannot be read or decoded.
    fn accumulated_for_date(&self, date: NaiveDate) -> Result<Option<SnapshotBatch>, StoreError> {
        Ok(accumulate_batches(&self.batches_for_date(date)?))
    }
}
