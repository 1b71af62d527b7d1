//! Keyword configuration parsing.
//!
//! The file is a list of blank-line separated groups:
//!
//! ```text
//! [WORD_GROUPS]
//! +required
//! normal
//! !group filter
//! @10
//!
//! [GLOBAL_FILTER]
//! suppressed everywhere
//! ```
//!
//! Without section markers the whole file is a `[WORD_GROUPS]` region.
//! Inside `[GLOBAL_FILTER]` every non-blank line is taken verbatim.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const WORD_GROUPS_MARKER: &str = "[WORD_GROUPS]";
const GLOBAL_FILTER_MARKER: &str = "[GLOBAL_FILTER]";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordGroup {
    pub required: Vec<String>,
    pub normal: Vec<String>,
    /// Tokens that exclude a title from this group only.
    pub filters: Vec<String>,
    pub group_key: String,
    /// Display cap for this group's titles; `0` means unlimited.
    pub max_display: usize,
    /// Zero-based position in the configuration file.
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordGroupSpec {
    pub groups: Vec<WordGroup>,
    /// Every group filter, flattened in file order.
    pub filter_words: Vec<String>,
    pub global_filters: Vec<String>,
}

impl WordGroupSpec {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.filter_words.is_empty() && self.global_filters.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    WordGroups,
    GlobalFilter,
}

enum Marker {
    Known(Section),
    Unknown,
}

#[derive(Default)]
struct GroupDraft {
    required: Vec<String>,
    normal: Vec<String>,
    filters: Vec<String>,
    max_display: usize,
    touched: bool,
}

impl GroupDraft {
    fn finish(self, position: usize) -> Option<WordGroup> {
        if self.required.is_empty() && self.normal.is_empty() {
            if self.touched {
                tracing::debug!(
                    filters = self.filters.len(),
                    "keyword group has no required or normal tokens, dropping"
                );
            }
            return None;
        }

        let group_key = if self.normal.is_empty() {
            self.required.join(" ")
        } else {
            self.normal.join(" ")
        };

        Some(WordGroup {
            required: self.required,
            normal: self.normal,
            filters: self.filters,
            group_key,
            max_display: self.max_display,
            position,
        })
    }
}

fn close_group(draft: &mut GroupDraft, spec: &mut WordGroupSpec) {
    let position = spec.groups.len();
    if let Some(group) = std::mem::take(draft).finish(position) {
        spec.groups.push(group);
    }
}

fn push_unique(list: &mut Vec<String>, token: &str) {
    if !token.is_empty() && !list.iter().any(|t| t == token) {
        list.push(token.to_string());
    }
}

/// Parse keyword configuration text into word groups and filters.
///
/// Never fails: malformed `@N` directives are logged and ignored.
#[must_use]
pub fn parse_word_groups(content: &str) -> WordGroupSpec {
    let mut spec = WordGroupSpec::default();
    let mut section = Section::WordGroups;
    let mut draft = GroupDraft::default();

    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();

        if line.is_empty() {
            close_group(&mut draft, &mut spec);
            continue;
        }

        if let Some(marker) = section_marker(line) {
            close_group(&mut draft, &mut spec);
            section = match marker {
                Marker::Known(next) => next,
                Marker::Unknown => {
                    tracing::warn!(
                        line = index + 1,
                        marker = line,
                        "unknown section marker, treating as [WORD_GROUPS]"
                    );
                    Section::WordGroups
                }
            };
            continue;
        }

        if section == Section::GlobalFilter {
            push_unique(&mut spec.global_filters, line);
            continue;
        }

        draft.touched = true;
        if let Some(token) = line.strip_prefix('+') {
            push_unique(&mut draft.required, token.trim());
        } else if let Some(token) = line.strip_prefix('!') {
            let token = token.trim();
            push_unique(&mut draft.filters, token);
            push_unique(&mut spec.filter_words, token);
        } else if let Some(raw) = line.strip_prefix('@') {
            match raw.trim().parse::<usize>() {
                Ok(n) => draft.max_display = n,
                Err(e) => tracing::warn!(
                    line = index + 1,
                    value = raw,
                    error = %e,
                    "invalid display cap, ignoring"
                ),
            }
        } else {
            push_unique(&mut draft.normal, line);
        }
    }
    close_group(&mut draft, &mut spec);

    spec
}

/// Bracketed upper-case lines are section markers; anything else is content.
fn section_marker(line: &str) -> Option<Marker> {
    match line {
        WORD_GROUPS_MARKER => Some(Marker::Known(Section::WordGroups)),
        GLOBAL_FILTER_MARKER => Some(Marker::Known(Section::GlobalFilter)),
        _ => {
            let inner = line.strip_prefix('[')?.strip_suffix(']')?;
            let looks_like_marker = !inner.is_empty()
                && inner
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c == '_');
            looks_like_marker.then_some(Marker::Unknown)
        }
    }
}

/// Read and parse a keyword configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::KeywordFileIo`] if the file is missing or unreadable.
pub fn load_word_groups(path: &Path) -> Result<WordGroupSpec, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let spec = parse_word_groups(&content);
    tracing::debug!(
        path = %path.display(),
        groups = spec.groups.len(),
        filter_words = spec.filter_words.len(),
        global_filters = spec.global_filters.len(),
        "loaded keyword configuration"
    );
    Ok(spec)
}

#[cfg(test)]
#[path = "word_groups_test.rs"]
mod tests;
