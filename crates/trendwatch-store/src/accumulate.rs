//! Folding a day's batches into one accumulated view.

use std::collections::{BTreeMap, HashMap};

use trendwatch_core::{SnapshotBatch, TitleRecord};

/// Merge a day's batches into the accumulated state for that day.
///
/// Per `(source, title)`: `first_seen` is the crawl time of the first batch
/// containing it, `last_seen` the crawl time of the last one,
/// `occurrence_count` the number of batches containing it and `ranks` the
/// concatenation of every batch's ranks. URLs take the most recent
/// non-empty value. Crawl time and failed sources come from the latest batch.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn accumulate_batches(batches: &[SnapshotBatch]) -> Option<SnapshotBatch> {
    let mut ordered: Vec<&SnapshotBatch> = batches.iter().collect();
    ordered.sort_by_key(|b| b.crawl_time);
    let latest = *ordered.last()?;

    let mut per_source: BTreeMap<String, Vec<TitleRecord>> = BTreeMap::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut source_names = BTreeMap::new();

    for batch in &ordered {
        source_names.extend(
            batch
                .source_names
                .iter()
                .map(|(id, name)| (id.clone(), name.clone())),
        );

        for (source_id, records) in &batch.per_source {
            let merged = per_source.entry(source_id.clone()).or_default();
            for record in records {
                let key = (source_id.clone(), record.title.clone());
                if let Some(&pos) = index.get(&key) {
                    let entry = &mut merged[pos];
                    entry.ranks.extend_from_slice(&record.ranks);
                    entry.occurrence_count = entry.occurrence_count.saturating_add(1);
                    entry.last_seen = Some(batch.crawl_time);
                    if !record.url.is_empty() {
                        entry.url.clone_from(&record.url);
                    }
                    if !record.mobile_url.is_empty() {
                        entry.mobile_url.clone_from(&record.mobile_url);
                    }
                    if !record.source_name.is_empty() {
                        entry.source_name.clone_from(&record.source_name);
                    }
                } else {
                    let mut entry = record.clone();
                    entry.source_id.clone_from(source_id);
                    entry.occurrence_count = 1;
                    entry.first_seen = Some(batch.crawl_time);
                    entry.last_seen = Some(batch.crawl_time);
                    entry.is_new = false;
                    index.insert(key, merged.len());
                    merged.push(entry);
                }
            }
        }
    }

    Some(SnapshotBatch {
        date: latest.date,
        crawl_time: latest.crawl_time,
        per_source,
        source_names,
        failed_sources: latest.failed_sources.clone(),
    })
}
