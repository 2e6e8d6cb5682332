//! Tuning knobs for dispatch and index behavior.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub dispatch: DispatchConfig,
    pub index: IndexConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DispatchConfig {
    /// Retries after the first failed attempt; transient errors only
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    /// Per storage call; a timeout counts as a transient failure
    pub storage_timeout_ms: u64,
    /// In-flight alert creations per dispatch
    pub concurrency: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            retry_backoff_ms: 50,
            storage_timeout_ms: 5000,
            concurrency: 8,
        }
    }
}

impl DispatchConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndexConfig {
    /// Candidate count above which containment tests run on the rayon pool
    pub parallel_threshold: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 64,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
