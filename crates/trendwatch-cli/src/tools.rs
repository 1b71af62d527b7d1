//! Small inspection commands for keyword and URL configuration.

use anyhow::Context as _;
use trendwatch_core::matcher::is_globally_filtered;
use trendwatch_core::{load_word_groups, matches_word_groups, normalize_url, AppConfig, WordGroupSpec};

/// Group keys that accept `title`, honouring global filters.
fn matching_groups<'a>(keywords: &'a WordGroupSpec, title: &str) -> Vec<&'a str> {
    let title_lower = title.trim().to_lowercase();
    if title_lower.is_empty() || is_globally_filtered(&title_lower, &keywords.global_filters) {
        return Vec::new();
    }
    keywords
        .groups
        .iter()
        .filter(|group| group.matches_lowered(&title_lower, &[]))
        .map(|group| group.group_key.as_str())
        .collect()
}

/// Print whether the configured keyword groups accept `title`.
///
/// # Errors
///
/// Returns an error if the keyword file cannot be read.
pub(crate) fn run_match(config: &AppConfig, title: &str) -> anyhow::Result<()> {
    let keywords = load_word_groups(&config.keywords_path).with_context(|| {
        format!("failed to load keywords from {}", config.keywords_path.display())
    })?;

    let matched = matches_word_groups(title, &keywords.groups, &[], &keywords.global_filters);
    let output = serde_json::json!({
        "title": title,
        "matched": matched,
        "groups": matching_groups(&keywords, title),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub(crate) fn run_canon(url: &str, source: Option<&str>) {
    println!("{}", normalize_url(url, source));
}
