//! Day-scoped change detection between the latest batch and the day so far.
//!
//! Every store read in here degrades to "no history" on failure: a broken
//! or missing snapshot must never abort a crawl cycle.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use trendwatch_core::{NewTitles, SnapshotBatch};

use crate::SnapshotStore;

/// True when at most one batch has been recorded for `date`.
///
/// Store failures count as a first crawl.
#[must_use]
pub fn is_first_crawl_today<S: SnapshotStore + ?Sized>(store: &S, date: NaiveDate) -> bool {
    match store.count_batches_for_date(date) {
        Ok(count) => count <= 1,
        Err(e) => {
            tracing::warn!(
                date = %date,
                error = %e,
                "could not count batches, assuming first crawl"
            );
            true
        }
    }
}

/// The accumulated state for `date`, or `None` when it is absent or unreadable.
#[must_use]
pub fn load_history<S: SnapshotStore + ?Sized>(
    store: &S,
    date: NaiveDate,
) -> Option<SnapshotBatch> {
    match store.accumulated_for_date(date) {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!(
                date = %date,
                error = %e,
                "could not read history, continuing without it"
            );
            None
        }
    }
}

/// Titles in `latest` that were first recorded by `latest` itself.
///
/// A title is new when its accumulated `first_seen` equals the latest crawl
/// time. Callers skip this on the day's first crawl; see
/// [`is_first_crawl_today`].
#[must_use]
pub fn detect_new_titles(
    latest: Option<&SnapshotBatch>,
    accumulated: Option<&SnapshotBatch>,
) -> NewTitles {
    let mut new_titles = NewTitles::new();
    let (Some(latest), Some(accumulated)) = (latest, accumulated) else {
        return new_titles;
    };

    let first_seen: HashMap<(&str, &str), Option<NaiveDateTime>> = accumulated
        .per_source
        .iter()
        .flat_map(|(source, records)| {
            records
                .iter()
                .map(move |r| ((source.as_str(), r.title.as_str()), r.first_seen))
        })
        .collect();

    let crawl = Some(latest.crawl_time);
    for (source, records) in &latest.per_source {
        for record in records {
            if first_seen.get(&(source.as_str(), record.title.as_str())) == Some(&crawl) {
                new_titles
                    .entry(source.clone())
                    .or_default()
                    .insert(record.title.clone());
            }
        }
    }

    new_titles
}

/// Store-backed [`detect_new_titles`] for `date`, optionally limited to `sources`.
///
/// Returns an empty map on the day's first crawl and whenever the store
/// cannot be read.
#[must_use]
pub fn detect_new_titles_for_date<S: SnapshotStore + ?Sized>(
    store: &S,
    date: NaiveDate,
    sources: Option<&BTreeSet<String>>,
) -> NewTitles {
    if is_first_crawl_today(store, date) {
        tracing::debug!(date = %date, "first crawl of the day, no new titles to report");
        return NewTitles::new();
    }

    let latest = match store.latest_batch_for_date(date) {
        Ok(latest) => latest,
        Err(e) => {
            tracing::warn!(date = %date, error = %e, "could not read latest batch");
            return NewTitles::new();
        }
    };
    let accumulated = load_history(store, date);

    let mut new_titles = detect_new_titles(latest.as_ref(), accumulated.as_ref());
    if let Some(sources) = sources {
        new_titles.retain(|source, _| sources.contains(source));
    }

    let total: usize = new_titles.values().map(BTreeSet::len).sum();
    tracing::info!(
        date = %date,
        sources = new_titles.len(),
        titles = total,
        "detected new titles"
    );
    new_titles
}
