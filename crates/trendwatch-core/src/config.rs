use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_optional_u32 = |var: &str| -> Result<Option<u32>, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(None),
        }
    };

    let env = parse_environment(&or_default("TRENDWATCH_ENV", "development"));
    let data_dir = PathBuf::from(or_default("TRENDWATCH_DATA_DIR", "./output"));
    let keywords_path = PathBuf::from(or_default(
        "TRENDWATCH_KEYWORDS_PATH",
        "./config/frequency_words.txt",
    ));
    let settings_path = PathBuf::from(or_default(
        "TRENDWATCH_SETTINGS_PATH",
        "./config/settings.yaml",
    ));
    let log_level = or_default("TRENDWATCH_LOG_LEVEL", "info");
    let rank_threshold_override = parse_optional_u32("TRENDWATCH_RANK_THRESHOLD")?;

    Ok(AppConfig {
        env,
        data_dir,
        keywords_path,
        settings_path,
        log_level,
        rank_threshold_override,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
