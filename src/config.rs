use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::graph::{NodeId, TraversalPolicy};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Graph API to pull snapshots from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub endpoint: Endpoint,
    #[serde(default)]
    pub module_ids: Vec<NodeId>,
    /// Traversal options forwarded verbatim to the API
    #[serde(default)]
    pub options: Value,
}

/// Which traversal the API runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    #[default]
    Module,
    Reverse,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Module => "/api/graph/module",
            Endpoint::Reverse => "/api/graph/reverse",
        }
    }
}

/// SQLite graph store
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Fetch retry behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "http://localhost:8069".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("graph.db")
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in MODGRAPH_CONFIG environment variable
    /// 2. ./modgraph.toml in current directory
    ///
    /// `MODGRAPH_HOST`, `MODGRAPH_MODULE_IDS`, `MODGRAPH_MAX_RETRIES` and
    /// `MODGRAPH_RETRY_DELAY` override the file values.
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("MODGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("modgraph.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("MODGRAPH_HOST") {
            self.source.host = host;
        }

        if let Ok(raw) = std::env::var("MODGRAPH_MODULE_IDS") {
            match serde_json::from_str::<Vec<NodeId>>(&raw) {
                Ok(ids) => self.source.module_ids = ids,
                Err(e) => log::warn!(
                    "Ignoring MODGRAPH_MODULE_IDS={:?} ({}), keeping {:?}",
                    raw,
                    e,
                    self.source.module_ids
                ),
            }
        }

        if let Ok(raw) = std::env::var("MODGRAPH_MAX_RETRIES") {
            self.retry.max_retries = raw
                .trim()
                .parse()
                .with_context(|| format!("MODGRAPH_MAX_RETRIES is not a number: {}", raw))?;
        }

        if let Ok(raw) = std::env::var("MODGRAPH_RETRY_DELAY") {
            self.retry.retry_delay_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("MODGRAPH_RETRY_DELAY is not a number: {}", raw))?;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let host = url::Url::parse(&self.source.host)
            .with_context(|| format!("source.host is not a valid URL: {}", self.source.host))?;
        if host.scheme() != "http" && host.scheme() != "https" {
            anyhow::bail!("source.host must be an http(s) URL, got {}", self.source.host);
        }

        if self.source.module_ids.is_empty() {
            anyhow::bail!("source.module_ids must list at least one module id");
        }

        if self.retry.max_retries == 0 {
            anyhow::bail!("retry.max_retries must be greater than 0");
        }

        self.policy().context("source.options is not a valid traversal policy")?;

        Ok(())
    }

    /// Traversal policy described by `source.options`
    pub fn policy(&self) -> crate::Result<TraversalPolicy> {
        TraversalPolicy::from_value(&self.source.options)
    }

    pub fn db_path(&self) -> &Path {
        &self.store.db_path
    }
}
