use std::collections::BTreeMap;

use chrono::NaiveDate;
use trendwatch_core::BatchBuilder;

use super::*;

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 15)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn sample_batch() -> SnapshotBatch {
    let mut builder = BatchBuilder::new(at(10, 0));
    builder
        .source_name("hackernews", "Hacker News")
        .source_name("reddit", "Reddit")
        .observe("hackernews", "AI breakthrough", 1, "https://example.com/ai", "")
        .observe("hackernews", "AI breakthrough", 2, "", "")
        .observe("hackernews", "New Python release", 3, "https://example.com/py", "")
        .observe("reddit", "AI breakthrough", 1, "https://reddit.com/ai", "");
    builder.build()
}

fn group(key: &str, required: &[&str], normal: &[&str], position: usize) -> WordGroup {
    WordGroup {
        required: required.iter().map(ToString::to_string).collect(),
        normal: normal.iter().map(ToString::to_string).collect(),
        group_key: key.to_string(),
        position,
        ..WordGroup::default()
    }
}

fn request<'a>(batch: &'a SnapshotBatch, groups: &'a [WordGroup]) -> FrequencyRequest<'a> {
    FrequencyRequest {
        results: &batch.per_source,
        source_names: &batch.source_names,
        word_groups: groups,
        filter_words: &[],
        global_filters: &[],
        history: None,
        new_titles: None,
    }
}

fn stat<'a>(report: &'a FrequencyReport, key: &str) -> &'a KeywordStat {
    report
        .stats
        .iter()
        .find(|s| s.group_key == key)
        .unwrap_or_else(|| panic!("no stat for {key}"))
}

#[test]
fn counts_matches_per_group() {
    let batch = sample_batch();
    let groups = [
        group("AI", &["AI"], &[], 0),
        group("Languages", &[], &["Python", "JavaScript"], 1),
    ];
    let report = count_word_frequency(&request(&batch, &groups), &FrequencyOptions::default());

    assert_eq!(report.total, 3);
    assert_eq!(report.stats.len(), 2);
    assert_eq!(report.stats[0].group_key, "AI", "larger group first");
    assert_eq!(stat(&report, "AI").count, 2);
    assert_eq!(stat(&report, "Languages").count, 1);
    assert!((stat(&report, "AI").percentage - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn shared_filters_reduce_stats_but_not_total() {
    let batch = sample_batch();
    let groups = [group("Tech", &[], &["AI", "Python"], 0)];
    let filters = vec!["breakthrough".to_string()];
    let mut req = request(&batch, &groups);
    req.filter_words = &filters;

    let report = count_word_frequency(&req, &FrequencyOptions::default());
    assert_eq!(report.total, 3);
    assert_eq!(report.stats.len(), 1);
    assert_eq!(report.stats[0].count, 1);
    assert_eq!(report.stats[0].titles[0].title, "New Python release");
}

#[test]
fn group_filter_only_skips_its_own_group() {
    let batch = sample_batch();
    let mut filtered = group("Filtered AI", &[], &["AI"], 0);
    filtered.filters = vec!["breakthrough".to_string()];
    let groups = [filtered, group("Plain AI", &[], &["AI"], 1)];

    let report = count_word_frequency(&request(&batch, &groups), &FrequencyOptions::default());
    assert_eq!(report.stats.len(), 1, "groups without matches are dropped");
    assert_eq!(stat(&report, "Plain AI").count, 2);
}

#[test]
fn global_filters_override_every_group() {
    let batch = sample_batch();
    let groups = [
        group("AI", &["AI"], &[], 0),
        group("Languages", &[], &["Python"], 1),
    ];
    let global = vec!["PYTHON".to_string()];
    let mut req = request(&batch, &groups);
    req.global_filters = &global;

    let report = count_word_frequency(&req, &FrequencyOptions::default());
    assert_eq!(report.total, 3);
    assert!(report.stats.iter().all(|s| s.group_key != "Languages"));
}

#[test]
fn empty_config_uses_catch_all_group() {
    let batch = sample_batch();
    let report = count_word_frequency(&request(&batch, &[]), &FrequencyOptions::default());

    assert_eq!(report.total, 3);
    assert_eq!(report.stats.len(), 1);
    assert_eq!(report.stats[0].group_key, ALL_NEWS_LABEL);
    assert_eq!(report.stats[0].count, 3);
    assert!((report.stats[0].percentage - 100.0).abs() < f64::EPSILON);
}

#[test]
fn history_supplies_count_and_time_span() {
    let batch = sample_batch();
    let mut history = batch.clone();
    let record = history
        .per_source
        .get_mut("hackernews")
        .and_then(|records| records.iter_mut().find(|r| r.title == "AI breakthrough"))
        .unwrap();
    record.occurrence_count = 5;
    record.ranks = vec![1, 2, 3];
    record.first_seen = Some(at(8, 0));
    record.last_seen = Some(at(10, 0));

    let groups = [group("AI", &[], &["AI"], 0)];
    let mut req = request(&batch, &groups);
    req.history = Some(&history);

    let report = count_word_frequency(&req, &FrequencyOptions::default());
    let entry = stat(&report, "AI")
        .titles
        .iter()
        .find(|t| t.source_id == "hackernews")
        .unwrap();
    assert_eq!(entry.count, 5);
    assert_eq!(entry.ranks, vec![1, 2, 3]);
    assert_eq!(entry.time_display, "[08:00 ~ 10:00]");
    assert_eq!(entry.url, "https://example.com/ai");
}

#[test]
fn new_titles_are_flagged_in_daily_mode() {
    let batch = sample_batch();
    let groups = [group("AI", &[], &["AI"], 0)];
    let mut new_titles = NewTitles::new();
    new_titles
        .entry("reddit".to_string())
        .or_default()
        .insert("AI breakthrough".to_string());
    let mut req = request(&batch, &groups);
    req.new_titles = Some(&new_titles);

    let report = count_word_frequency(&req, &FrequencyOptions::default());
    let ai = stat(&report, "AI");
    assert_eq!(ai.count, 2);
    for entry in &ai.titles {
        assert_eq!(entry.is_new, entry.source_name == "Reddit", "{}", entry.source_name);
    }
}

#[test]
fn titles_are_ordered_by_weight() {
    let batch = sample_batch();
    let groups = [group("AI", &[], &["AI"], 0)];
    let report = count_word_frequency(&request(&batch, &groups), &FrequencyOptions::default());

    let titles = &stat(&report, "AI").titles;
    assert_eq!(titles[0].source_name, "Hacker News");
    assert_eq!(titles[1].source_name, "Reddit");
    assert!(titles[0].weight > titles[1].weight);
    assert_eq!(titles[0].time_display, "10:00");
}

#[test]
fn display_caps_truncate_titles_but_not_count() {
    let batch = sample_batch();
    let mut capped = group("AI", &[], &["AI"], 0);
    capped.max_display = 1;
    let report = count_word_frequency(
        &request(&batch, std::slice::from_ref(&capped)),
        &FrequencyOptions::default(),
    );
    assert_eq!(stat(&report, "AI").count, 2);
    assert_eq!(stat(&report, "AI").titles.len(), 1);

    let groups = [group("Tech", &[], &["AI", "Python"], 0)];
    let options = FrequencyOptions {
        max_display: 2,
        ..FrequencyOptions::default()
    };
    let report = count_word_frequency(&request(&batch, &groups), &options);
    assert_eq!(stat(&report, "Tech").count, 3);
    assert_eq!(stat(&report, "Tech").titles.len(), 2);
}

#[test]
fn position_ordering_is_opt_in() {
    let batch = sample_batch();
    let groups = [
        group("Python", &[], &["Python"], 0),
        group("AI", &[], &["AI"], 1),
    ];

    let by_count = count_word_frequency(&request(&batch, &groups), &FrequencyOptions::default());
    assert_eq!(by_count.stats[0].group_key, "AI");

    let options = FrequencyOptions {
        sort_by_position_first: true,
        ..FrequencyOptions::default()
    };
    let by_position = count_word_frequency(&request(&batch, &groups), &options);
    assert_eq!(by_position.stats[0].group_key, "Python");
    assert_eq!(by_position.stats[1].group_key, "AI");
}

#[test]
fn incremental_first_crawl_marks_everything_new() {
    let batch = sample_batch();
    let groups = [group("AI", &[], &["AI"], 0)];
    let options = FrequencyOptions {
        mode: ReportMode::Incremental,
        is_first_crawl: true,
        ..FrequencyOptions::default()
    };

    let report = count_word_frequency(&request(&batch, &groups), &options);
    assert_eq!(report.total, 3);
    assert_eq!(stat(&report, "AI").count, 2);
    assert!(stat(&report, "AI").titles.iter().all(|t| t.is_new));
}

#[test]
fn incremental_later_crawl_keeps_only_new_titles() {
    let batch = sample_batch();
    let groups = [group("AI", &[], &["AI"], 0)];
    let options = FrequencyOptions {
        mode: ReportMode::Incremental,
        ..FrequencyOptions::default()
    };

    let mut new_titles = NewTitles::new();
    new_titles
        .entry("reddit".to_string())
        .or_default()
        .insert("AI breakthrough".to_string());
    let mut req = request(&batch, &groups);
    req.new_titles = Some(&new_titles);

    let report = count_word_frequency(&req, &options);
    assert_eq!(report.total, 3);
    let ai = stat(&report, "AI");
    assert_eq!(ai.count, 1);
    assert_eq!(ai.titles[0].source_id, "reddit");
    assert!(ai.titles[0].is_new);

    let nothing = count_word_frequency(&request(&batch, &groups), &options);
    assert!(nothing.stats.is_empty());
    assert_eq!(nothing.total, 3);
}

#[test]
fn current_mode_keeps_titles_listed_at_latest_crawl() {
    let batch = sample_batch();
    let mut history = batch.clone();
    for records in history.per_source.values_mut() {
        for record in records {
            if record.title == "New Python release" {
                record.last_seen = Some(at(9, 0));
            }
        }
    }

    let groups = [
        group("AI", &[], &["AI"], 0),
        group("Python", &[], &["Python"], 1),
    ];
    let options = FrequencyOptions {
        mode: ReportMode::Current,
        ..FrequencyOptions::default()
    };
    let mut req = request(&batch, &groups);
    req.history = Some(&history);

    let report = count_word_frequency(&req, &options);
    assert_eq!(report.total, 3);
    assert_eq!(stat(&report, "AI").count, 2);
    assert!(report.stats.iter().all(|s| s.group_key != "Python"));

    let without_history = count_word_frequency(&request(&batch, &groups), &options);
    assert_eq!(without_history.stats.len(), 2, "behaves like daily");
}

#[test]
fn duplicate_records_in_one_source_count_once() {
    let mut batch = sample_batch();
    let extra = batch.per_source["reddit"][0].clone();
    batch.per_source.get_mut("reddit").unwrap().push(extra);

    let groups = [group("AI", &[], &["AI"], 0)];
    let report = count_word_frequency(&request(&batch, &groups), &FrequencyOptions::default());
    assert_eq!(report.total, 3);
    assert_eq!(stat(&report, "AI").count, 2);

    let reddit = stat(&report, "AI")
        .titles
        .iter()
        .find(|t| t.source_id == "reddit")
        .unwrap();
    assert_eq!(reddit.ranks, vec![1, 1]);
    assert_eq!(reddit.count, 2);
}

#[test]
fn missing_source_name_falls_back_to_id() {
    let batch = sample_batch();
    let names = BTreeMap::new();
    let groups = [group("AI", &[], &["AI"], 0)];
    let mut req = request(&batch, &groups);
    req.source_names = &names;

    let report = count_word_frequency(&req, &FrequencyOptions::default());
    assert!(stat(&report, "AI")
        .titles
        .iter()
        .any(|t| t.source_name == "reddit"));
}

#[test]
fn helper_caps_and_percentages() {
    assert_eq!(display_cap(0, 0), None);
    assert_eq!(display_cap(3, 0), Some(3));
    assert_eq!(display_cap(0, 4), Some(4));
    assert_eq!(display_cap(5, 2), Some(2));
    assert!(percentage(1, 0).abs() < f64::EPSILON);
    assert!((percentage(1, 4) - 25.0).abs() < f64::EPSILON);
}
