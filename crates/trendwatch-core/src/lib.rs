//! Shared domain model and pure building blocks for trendwatch.
//!
//! Everything in this crate is synchronous and side-effect free apart from
//! the configuration loaders, which read the environment and config files
//! once at startup.

pub mod app_config;
pub mod batch;
pub mod config;
pub mod matcher;
pub mod record;
pub mod settings;
pub mod time_fmt;
pub mod url_canon;
pub mod weight;
pub mod word_groups;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use batch::{collapse_duplicates, BatchBuilder, CrawlResults, TitleDetail, TitleInfo};
pub use config::{load_app_config, load_app_config_from_env};
pub use matcher::matches_word_groups;
pub use record::{NewTitles, RssItem, SnapshotBatch, TitleRecord};
pub use settings::{load_settings, ReportMode, RssFeedConfig, Settings, SourceConfig};
pub use url_canon::{normalize_url, url_signature};
pub use weight::{calculate_weight, WeightConfig};
pub use word_groups::{load_word_groups, parse_word_groups, WordGroup, WordGroupSpec};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read settings file {path}: {source}")]
    SettingsFileIo {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse settings file: {0}")]
    SettingsFileParse(#[from] serde_yaml::Error),

    #[error("failed to read keyword file {path}: {source}")]
    KeywordFileIo {
        path: String,
        source: std::io::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}
