//! YAML settings file: sources, report behaviour, weights, storage and RSS.
//!
//! The file is optional. Every section has defaults, and the lenient numeric
//! fields under `rss` fall back to documented values instead of failing.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::weight::WeightConfig;
use crate::ConfigError;

/// Global RSS freshness window used when the configured value is unusable.
pub const DEFAULT_MAX_AGE_DAYS: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Everything seen today.
    #[default]
    Daily,
    /// Only titles still present in the latest crawl.
    Current,
    /// Only titles that first appeared in the latest crawl.
    Incremental,
}

impl std::fmt::Display for ReportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportMode::Daily => write!(f, "daily"),
            ReportMode::Current => write!(f, "current"),
            ReportMode::Incremental => write!(f, "incremental"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub mode: ReportMode,
    pub rank_threshold: u32,
    pub sort_by_position_first: bool,
    /// Global cap on titles per keyword group; `0` means unlimited.
    pub max_news_per_keyword: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            mode: ReportMode::Daily,
            rank_threshold: 5,
            sort_by_position_first: false,
            max_news_per_keyword: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub write_text_snapshots: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessSettings {
    pub enabled: bool,
    pub max_age_days: u32,
}

impl Default for FreshnessSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RssFeedConfig {
    pub id: String,
    pub name: String,
    /// `None` defers to the global window; `Some(0)` disables the filter.
    pub max_age_days: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssSettings {
    pub freshness: FreshnessSettings,
    pub feeds: Vec<RssFeedConfig>,
}

impl RssSettings {
    /// Effective freshness window for a feed in days; `0` means keep everything.
    #[must_use]
    pub fn max_age_days_for(&self, feed_id: &str) -> u32 {
        if !self.freshness.enabled {
            return 0;
        }
        self.feeds
            .iter()
            .find(|f| f.id == feed_id)
            .and_then(|f| f.max_age_days)
            .unwrap_or(self.freshness.max_age_days)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub sources: Vec<SourceConfig>,
    pub report: ReportSettings,
    pub weight: WeightConfig,
    pub storage: StorageSettings,
    pub rss: RssSettings,
}

impl Settings {
    /// Source id to display name, for sources declared in the settings file.
    #[must_use]
    pub fn source_names(&self) -> BTreeMap<String, String> {
        self.sources
            .iter()
            .map(|s| (s.id.clone(), s.name.clone()))
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    sources: Vec<SourceConfig>,
    report: ReportSettings,
    weight: WeightConfig,
    storage: StorageSettings,
    rss: RawRss,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRss {
    freshness: RawFreshness,
    feeds: Vec<RawFeed>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFreshness {
    enabled: Option<bool>,
    max_age_days: Option<serde_yaml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFeed {
    id: Option<String>,
    name: Option<String>,
    max_age_days: Option<serde_yaml::Value>,
}

/// Load and validate settings from a YAML file.
///
/// A missing file yields [`Settings::default`].
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read, parsed, or
/// fails validation.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "settings file not found, using defaults");
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SettingsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_settings(&content)
}

/// Parse and validate settings from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` on malformed YAML or failed validation.
pub fn parse_settings(content: &str) -> Result<Settings, ConfigError> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }

    let file: SettingsFile = serde_yaml::from_str(content)?;
    let settings = resolve(file);
    validate_settings(&settings)?;
    Ok(settings)
}

fn resolve(file: SettingsFile) -> Settings {
    let sources = file
        .sources
        .into_iter()
        .map(|s| {
            let name = if s.name.trim().is_empty() {
                s.id.clone()
            } else {
                s.name
            };
            SourceConfig { id: s.id, name }
        })
        .collect();

    let max_age_days = match file.rss.freshness.max_age_days.as_ref() {
        None => DEFAULT_MAX_AGE_DAYS,
        Some(raw) => match lenient_days(raw).map(u32::try_from) {
            Some(Ok(days)) => days,
            _ => {
                tracing::warn!(
                    value = ?raw,
                    fallback = DEFAULT_MAX_AGE_DAYS,
                    "invalid rss.freshness.max_age_days, using default"
                );
                DEFAULT_MAX_AGE_DAYS
            }
        },
    };

    let feeds = file
        .rss
        .feeds
        .into_iter()
        .filter_map(|feed| {
            let Some(id) = feed.id.filter(|id| !id.trim().is_empty()) else {
                tracing::warn!(name = ?feed.name, "rss feed without id, skipping");
                return None;
            };
            let max_age_days = feed.max_age_days.as_ref().and_then(|raw| {
                match lenient_days(raw).map(u32::try_from) {
                    Some(Ok(days)) => Some(days),
                    _ => {
                        tracing::warn!(
                            feed = %id,
                            value = ?raw,
                            "invalid per-feed max_age_days, using global window"
                        );
                        None
                    }
                }
            });
            let name = feed.name.unwrap_or_else(|| id.clone());
            Some(RssFeedConfig {
                id,
                name,
                max_age_days,
            })
        })
        .collect();

    Settings {
        sources,
        report: file.report,
        weight: file.weight,
        storage: file.storage,
        rss: RssSettings {
            freshness: FreshnessSettings {
                enabled: file.rss.freshness.enabled.unwrap_or(true),
                max_age_days,
            },
            feeds,
        },
    }
}

/// Accepts integers and numeric strings; anything else is unusable.
fn lenient_days(value: &serde_yaml::Value) -> Option<i64> {
    match value {
        serde_yaml::Value::Number(n) => n.as_i64(),
        serde_yaml::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for source in &settings.sources {
        if source.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source id must be non-empty".to_string(),
            ));
        }
        if !seen_ids.insert(source.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source id: '{}'",
                source.id
            )));
        }
    }

    let weight = &settings.weight;
    for (name, value) in [
        ("rank", weight.rank_weight),
        ("frequency", weight.frequency_weight),
        ("hotness", weight.hotness_weight),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Validation(format!(
                "weight.{name} must be a non-negative number, got {value}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
