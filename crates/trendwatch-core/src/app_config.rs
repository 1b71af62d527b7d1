use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-level configuration, assembled once at startup.
///
/// Nothing below the CLI reads the environment; callers pass the fields
/// they need into the store and analysis functions.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub data_dir: PathBuf,
    pub keywords_path: PathBuf,
    pub settings_path: PathBuf,
    pub log_level: String,
    /// Overrides `report.rank_threshold` from the settings file when set.
    pub rank_threshold_override: Option<u32>,
}
