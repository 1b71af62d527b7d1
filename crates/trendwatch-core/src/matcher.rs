//! Case-insensitive substring matching of titles against word groups.

use crate::word_groups::WordGroup;

fn contains_any(haystack: &str, tokens: &[String]) -> bool {
    tokens
        .iter()
        .any(|t| !t.is_empty() && haystack.contains(&t.to_lowercase()))
}

/// True when any global filter occurs in the already-lowercased title.
#[must_use]
pub fn is_globally_filtered(title_lower: &str, global_filters: &[String]) -> bool {
    contains_any(title_lower, global_filters)
}

impl WordGroup {
    /// Whether an already-lowercased title satisfies this group.
    ///
    /// `shared_filters` apply on top of the group's own filters. All
    /// required tokens must occur; when normal tokens exist at least one
    /// must occur too.
    #[must_use]
    pub fn matches_lowered(&self, title_lower: &str, shared_filters: &[String]) -> bool {
        if contains_any(title_lower, &self.filters) || contains_any(title_lower, shared_filters) {
            return false;
        }

        let required_ok = self
            .required
            .iter()
            .all(|t| title_lower.contains(&t.to_lowercase()));
        if !required_ok {
            return false;
        }

        self.normal.is_empty() || contains_any(title_lower, &self.normal)
    }
}

/// Decide whether `title` belongs to any of `groups`.
///
/// An empty group list accepts everything. Global filters take priority
/// over every group; a blank title never matches a non-empty group list.
#[must_use]
pub fn matches_word_groups(
    title: &str,
    groups: &[WordGroup],
    filter_words: &[String],
    global_filters: &[String],
) -> bool {
    if groups.is_empty() {
        return true;
    }

    let title_lower = title.trim().to_lowercase();
    if title_lower.is_empty() {
        return false;
    }

    if is_globally_filtered(&title_lower, global_filters) {
        return false;
    }

    groups
        .iter()
        .any(|group| group.matches_lowered(&title_lower, filter_words))
}
