//! Regroup keyword-centric stats by source.

use std::collections::{HashMap, HashSet};

use trendwatch_core::{calculate_weight, url_signature, WeightConfig};

use crate::types::{KeywordStat, PlatformStat, TitleEntry};

struct Bucket {
    source_name: String,
    titles: Vec<TitleEntry>,
    seen: HashSet<(String, String)>,
}

/// Build one [`PlatformStat`] per source name from `keyword_stats`.
///
/// Entries keep the group key that matched them. Within a source an entry
/// is dropped when an earlier one has the same title and canonical URL.
/// Titles are re-scored and ordered by weight; sources are ordered by how
/// many titles they hold.
#[must_use]
pub fn to_platform_stats(
    keyword_stats: &[KeywordStat],
    weight: &WeightConfig,
    rank_threshold: u32,
) -> Vec<PlatformStat> {
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for stat in keyword_stats {
        for entry in &stat.titles {
            let pos = *index.entry(entry.source_name.clone()).or_insert_with(|| {
                buckets.push(Bucket {
                    source_name: entry.source_name.clone(),
                    titles: Vec::new(),
                    seen: HashSet::new(),
                });
                buckets.len() - 1
            });
            let bucket = &mut buckets[pos];

            let key = (
                entry.title.clone(),
                url_signature(&entry.url, Some(&entry.source_id)),
            );
            if !bucket.seen.insert(key) {
                continue;
            }

            let mut entry = entry.clone();
            entry.matched_keyword = Some(stat.group_key.clone());
            entry.weight = calculate_weight(&entry.ranks, Some(entry.count), rank_threshold, weight);
            bucket.titles.push(entry);
        }
    }

    let mut stats: Vec<PlatformStat> = buckets
        .into_iter()
        .map(|mut bucket| {
            bucket.titles.sort_by(|a, b| b.weight.total_cmp(&a.weight));
            PlatformStat {
                source_name: bucket.source_name,
                count: bucket.titles.len(),
                titles: bucket.titles,
            }
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}
