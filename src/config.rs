//! Configuration loader and validator for the price-comparison pipeline.
use crate::model::SortOrder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub api: Api,
    pub campaign: Campaign,
    pub run: Run,
}

/// Remote search API credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    pub base_url: String,
    pub login: String,
    pub password: String,
}

/// Fixed parameters applied to every task spec in a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub location_name: String,
    pub language_name: String,
    pub sort_by: SortOrder,
    pub priority: i64,
    /// Each task's minimum price filter is this ratio of the product's
    /// reference price.
    pub price_min_ratio: f64,
}

/// Run tuning and file locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Run {
    /// Durable store for created task ids. A plain path selects the
    /// newline-delimited file backend; a `sqlite:` URL selects SQLite.
    pub task_store: String,
    pub post_audit_file: String,
    pub results_audit_file: String,
    pub report_file: String,
    /// Delay between submission calls. The per-minute call quota is global,
    /// so this must be tuned against expected batch count.
    pub submit_pace_ms: u64,
    /// Single wait before fetching results; queued tasks get this long to
    /// complete.
    pub poll_wait_secs: u64,
    /// Concurrent in-flight fetches during polling. 1 reproduces the fully
    /// sequential reference behavior.
    pub fetch_concurrency: usize,
}

impl Run {
    pub fn uses_sqlite_store(&self) -> bool {
        self.task_store.starts_with("sqlite:")
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.base_url must be non-empty"));
    }
    if cfg.api.login.trim().is_empty() {
        return Err(ConfigError::Invalid("api.login must be non-empty"));
    }
    if cfg.api.password.trim().is_empty() {
        return Err(ConfigError::Invalid("api.password must be non-empty"));
    }

    if cfg.campaign.location_name.trim().is_empty() {
        return Err(ConfigError::Invalid("campaign.location_name must be non-empty"));
    }
    if cfg.campaign.language_name.trim().is_empty() {
        return Err(ConfigError::Invalid("campaign.language_name must be non-empty"));
    }
    if cfg.campaign.priority <= 0 {
        return Err(ConfigError::Invalid("campaign.priority must be > 0"));
    }
    if !(cfg.campaign.price_min_ratio > 0.0) {
        return Err(ConfigError::Invalid("campaign.price_min_ratio must be > 0"));
    }

    if cfg.run.task_store.trim().is_empty() {
        return Err(ConfigError::Invalid("run.task_store must be non-empty"));
    }
    if cfg.run.post_audit_file.trim().is_empty() {
        return Err(ConfigError::Invalid("run.post_audit_file must be non-empty"));
    }
    if cfg.run.results_audit_file.trim().is_empty() {
        return Err(ConfigError::Invalid("run.results_audit_file must be non-empty"));
    }
    if cfg.run.report_file.trim().is_empty() {
        return Err(ConfigError::Invalid("run.report_file must be non-empty"));
    }
    if cfg.run.fetch_concurrency == 0 {
        return Err(ConfigError::Invalid("run.fetch_concurrency must be > 0"));
    }

    Ok(())
}

/// Canonical example configuration; also the fixture the tests build on.
pub fn example() -> &'static str {
    r#"api:
  base_url: "https://api.dataforseo.com/"
  login: "YOUR_API_LOGIN"
  password: "YOUR_API_PASSWORD"

campaign:
  location_name: "Canada"
  language_name: "English"
  sort_by: "price_low_to_high"
  priority: 2
  price_min_ratio: 0.5

run:
  task_store: "./data/task_ids.dat"
  post_audit_file: "./data/post_responses.json"
  results_audit_file: "./data/task_results.json"
  report_file: "./data/results.csv"
  submit_pace_ms: 50
  poll_wait_secs: 360
  fetch_concurrency: 1
"#
}
