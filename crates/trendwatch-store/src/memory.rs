use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use trendwatch_core::SnapshotBatch;

use crate::{SnapshotStore, StoreError};

/// In-process store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    batches: Mutex<BTreeMap<NaiveDate, Vec<SnapshotBatch>>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save_batch(&self, batch: &SnapshotBatch) -> Result<(), StoreError> {
        let mut guard = self.batches.lock().map_err(|_| StoreError::Poisoned)?;
        guard.entry(batch.date).or_default().push(batch.clone());
        Ok(())
    }

    fn batches_for_date(&self, date: NaiveDate) -> Result<Vec<SnapshotBatch>, StoreError> {
        let guard = self.batches.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(&date).cloned().unwrap_or_default())
    }

    fn count_batches_for_date(&self, date: NaiveDate) -> Result<usize, StoreError> {
        let guard = self.batches.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(&date).map_or(0, Vec::len))
    }
}
