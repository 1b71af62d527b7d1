//! Local filesystem snapshot store.
//!
//! Layout: `<root>/<YYYY-MM-DD>/snapshots/<seq>-<HHMMSS>.json`, with an
//! optional plain-text twin under `<root>/<YYYY-MM-DD>/txt/`. Every file is
//! written to a hidden temp file and renamed into place.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use trendwatch_core::SnapshotBatch;

use crate::text::render_text_snapshot;
use crate::{SnapshotStore, StoreError};

const SNAPSHOT_DIR: &str = "snapshots";
const TEXT_DIR: &str = "txt";
const SNAPSHOT_EXT: &str = "json";

#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    root: PathBuf,
    write_text: bool,
}

impl FsSnapshotStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_text: false,
        }
    }

    /// Also write a plain-text rendering next to every saved batch.
    #[must_use]
    pub fn with_text_snapshots(mut self, enabled: bool) -> Self {
        self.write_text = enabled;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn date_dir(&self, date: NaiveDate) -> PathBuf {
        self.root.join(date.format("%Y-%m-%d").to_string())
    }

    // ---------------------------------------------------------------------------
    // Listing
    // ---------------------------------------------------------------------------

    /// Snapshot files for `date` sorted by sequence number. A missing
    /// directory means no batches yet.
    fn snapshot_files(&self, date: NaiveDate) -> Result<Vec<(u32, PathBuf)>, StoreError> {
        let dir = self.date_dir(date).join(SNAPSHOT_DIR);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io { path: dir, source: e }),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io {
                path: dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if let Some(seq) = snapshot_sequence(&path) {
                files.push((seq, path));
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_batch(path: &Path) -> Result<SnapshotBatch, StoreError> {
        let bytes = std::fs::read(path).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Sequence number of a committed snapshot file; `None` for temp files and
/// anything else sharing the directory.
fn snapshot_sequence(path: &Path) -> Option<u32> {
    if path.extension()? != SNAPSHOT_EXT {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.starts_with('.') {
        return None;
    }
    let (seq, _) = stem.split_once('-')?;
    seq.parse().ok()
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| StoreError::Io { path, source }
    };

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(io_err(parent))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = parent.join(format!(".{file_name}.tmp"));

    std::fs::write(&tmp, contents).map_err(io_err(&tmp))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path)(e));
    }
    Ok(())
}

impl SnapshotStore for FsSnapshotStore {
    fn save_batch(&self, batch: &SnapshotBatch) -> Result<(), StoreError> {
        let next_seq = self
            .snapshot_files(batch.date)?
            .last()
            .map_or(1, |(seq, _)| seq + 1);
        let stem = format!("{next_seq:04}-{}", batch.crawl_time.format("%H%M%S"));
        let date_dir = self.date_dir(batch.date);

        let json = serde_json::to_vec_pretty(batch)?;
        let path = date_dir
            .join(SNAPSHOT_DIR)
            .join(format!("{stem}.{SNAPSHOT_EXT}"));
        write_atomic(&path, &json)?;

        if self.write_text {
            let text_path = date_dir.join(TEXT_DIR).join(format!("{stem}.txt"));
            write_atomic(&text_path, render_text_snapshot(batch).as_bytes())?;
        }

        tracing::debug!(
            path = %path.display(),
            titles = batch.title_count(),
            "saved snapshot batch"
        );
        Ok(())
    }

    fn batches_for_date(&self, date: NaiveDate) -> Result<Vec<SnapshotBatch>, StoreError> {
        self.snapshot_files(date)?
            .iter()
            .map(|(_, path)| Self::read_batch(path))
            .collect()
    }

    fn count_batches_for_date(&self, date: NaiveDate) -> Result<usize, StoreError> {
        Ok(self.snapshot_files(date)?.len())
    }

    fn latest_batch_for_date(&self, date: NaiveDate) -> Result<Option<SnapshotBatch>, StoreError> {
        self.snapshot_files(date)?
            .last()
            .map(|(_, path)| Self::read_batch(path))
            .transpose()
    }
}
