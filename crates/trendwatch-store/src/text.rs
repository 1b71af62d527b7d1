//! Human-readable companion rendering of a batch.

use std::fmt::Write as _;

use trendwatch_core::SnapshotBatch;

const FAILED_HEADER: &str = "==== failed sources ====";

/// Render a batch as plain text, one block per source.
///
/// Each block starts with `id | name` (just `id` when they match) followed
/// by `rank. title [URL:..] [MOBILE:..]` lines ordered by best rank. Titles
/// without ranks are listed at rank 1.
#[must_use]
pub fn render_text_snapshot(batch: &SnapshotBatch) -> String {
    let mut out = String::new();

    for (source_id, records) in &batch.per_source {
        let name = batch.source_name(source_id);
        if name == source_id {
            let _ = writeln!(out, "{source_id}");
        } else {
            let _ = writeln!(out, "{source_id} | {name}");
        }

        let mut lines: Vec<(u32, &str, &str, &str)> = records
            .iter()
            .map(|r| {
                (
                    r.best_rank().unwrap_or(1),
                    r.title.as_str(),
                    r.url.as_str(),
                    r.mobile_url.as_str(),
                )
            })
            .collect();
        lines.sort_by_key(|(rank, ..)| *rank);

        for (rank, title, url, mobile_url) in lines {
            let _ = write!(out, "{rank}. {title}");
            if !url.is_empty() {
                let _ = write!(out, " [URL:{url}]");
            }
            if !mobile_url.is_empty() {
                let _ = write!(out, " [MOBILE:{mobile_url}]");
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !batch.failed_sources.is_empty() {
        let _ = writeln!(out, "{FAILED_HEADER}");
        for id in &batch.failed_sources {
            let _ = writeln!(out, "{id}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use trendwatch_core::{BatchBuilder, TitleRecord};

    use super::*;

    #[test]
    fn renders_sources_ranks_and_failures() {
        let crawl = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut builder = BatchBuilder::new(crawl);
        builder
            .source_name("weibo", "Weibo")
            .observe("weibo", "Second", 2, "https://a.test/2", "https://m.a.test/2")
            .observe("weibo", "First", 1, "", "")
            .observe("zhihu", "Only", 5, "", "")
            .mark_failed("baidu");
        let mut batch = builder.build();
        batch
            .per_source
            .get_mut("zhihu")
            .unwrap()
            .push(TitleRecord::new("zhihu", "Unranked"));

        let text = render_text_snapshot(&batch);
        let expected = "weibo | Weibo\n\
                        1. First\n\
                        2. Second [URL:https://a.test/2] [MOBILE:https://m.a.test/2]\n\
                        \n\
                        zhihu\n\
                        1. Unranked\n\
                        5. Only\n\
                        \n\
                        ==== failed sources ====\n\
                        baidu\n";
        assert_eq!(text, expected);
    }
}
