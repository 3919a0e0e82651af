use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime configuration. Defaults are overlaid by an optional
/// `gemscout.toml`, then by `GEMSCOUT_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub hn_api_base: String,
    /// Minutes between ingestion sweeps. 0 disables the job.
    pub sweep_interval_minutes: u64,
    /// Upper bound on ids listed per sweep.
    pub sweep_max_ids: usize,
    /// Progress is logged every this many created posts.
    pub sweep_batch_size: usize,
    /// Hours between success re-checks of flagged gems. 0 disables.
    pub success_check_interval_hours: u64,
    /// A post only qualifies as a gem while its author is below this.
    pub karma_threshold: i64,
    pub min_interest_score: f64,
    /// HN score at which a gem counts as verified successful.
    pub success_score_threshold: i64,
    /// Ingestion window for scheduled sweeps, in minutes.
    pub ingest_window_minutes: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://gemscout.db?mode=rwc".to_string(),
            hn_api_base: "https://hacker-news.firebaseio.com/v0".to_string(),
            sweep_interval_minutes: 5,
            sweep_max_ids: 500,
            sweep_batch_size: 25,
            success_check_interval_hours: 6,
            karma_threshold: 100,
            min_interest_score: 0.3,
            success_score_threshold: 100,
            ingest_window_minutes: 60,
            request_timeout_secs: 10,
            user_agent: "gemscout/0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then `gemscout.toml` if present,
    /// then environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string("gemscout.toml") {
            Ok(contents) => toml::from_str(&contents)?,
            Err(_) => Config::default(),
        };
        config.overlay_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit TOML file, then environment variables.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let mut config: Config = toml::from_str(&contents)?;
        config.overlay_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `GEMSCOUT_*` overrides from an arbitrary variable source.
    /// Split out from `load` so tests can inject variables directly.
    pub fn overlay_env<F>(&mut self, get: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("GEMSCOUT_DATABASE_URL") {
            self.database_url = v;
        }
        if let Some(v) = get("GEMSCOUT_HN_API_BASE") {
            self.hn_api_base = v;
        }
        if let Some(v) = get("GEMSCOUT_SWEEP_INTERVAL_MINUTES") {
            self.sweep_interval_minutes = parse_field("GEMSCOUT_SWEEP_INTERVAL_MINUTES", &v)?;
        }
        if let Some(v) = get("GEMSCOUT_SWEEP_MAX_IDS") {
            self.sweep_max_ids = parse_field("GEMSCOUT_SWEEP_MAX_IDS", &v)?;
        }
        if let Some(v) = get("GEMSCOUT_SWEEP_BATCH_SIZE") {
            self.sweep_batch_size = parse_field("GEMSCOUT_SWEEP_BATCH_SIZE", &v)?;
        }
        if let Some(v) = get("GEMSCOUT_SUCCESS_CHECK_INTERVAL_HOURS") {
            self.success_check_interval_hours =
                parse_field("GEMSCOUT_SUCCESS_CHECK_INTERVAL_HOURS", &v)?;
        }
        if let Some(v) = get("GEMSCOUT_KARMA_THRESHOLD") {
            self.karma_threshold = parse_field("GEMSCOUT_KARMA_THRESHOLD", &v)?;
        }
        if let Some(v) = get("GEMSCOUT_MIN_INTEREST_SCORE") {
            self.min_interest_score = parse_field("GEMSCOUT_MIN_INTEREST_SCORE", &v)?;
        }
        if let Some(v) = get("GEMSCOUT_SUCCESS_SCORE_THRESHOLD") {
            self.success_score_threshold = parse_field("GEMSCOUT_SUCCESS_SCORE_THRESHOLD", &v)?;
        }
        if let Some(v) = get("GEMSCOUT_INGEST_WINDOW_MINUTES") {
            self.ingest_window_minutes = parse_field("GEMSCOUT_INGEST_WINDOW_MINUTES", &v)?;
        }
        if let Some(v) = get("GEMSCOUT_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_field("GEMSCOUT_REQUEST_TIMEOUT_SECS", &v)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_interest_score) {
            return Err(ConfigError::InvalidValue {
                field: "min_interest_score".to_string(),
                value: self.min_interest_score.to_string(),
            });
        }
        if self.sweep_max_ids == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sweep_max_ids".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}
