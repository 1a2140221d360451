//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section except `[data]` is optional and falls back to the built-in
//! defaults, so a config only needs to name what it changes.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::ep::EstimatorConfig;
use crate::optimizer::{OptimizerConfig, SquadRules};
use crate::storage::json::DEFAULT_EP_FILE;
use crate::types::Gameweek;

/// Env var that overrides the config file path.
pub const CONFIG_PATH_ENV: &str = "SQUADSMITH_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub squad: SquadRules,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub plan: PlanConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Which gameweeks to plan over.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlanConfig {
    pub gw_start: Gameweek,
    /// Number of consecutive gameweeks summed into the horizon EP.
    pub horizon: u32,
    /// Rows shown per position in the top-EP listing.
    pub top_limit: usize,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self { gw_start: 1, horizon: 6, top_limit: 20 }
    }
}

impl PlanConfig {
    /// Last gameweek of the horizon, or `None` for an empty horizon.
    pub fn gw_end(&self) -> Option<Gameweek> {
        if self.horizon == 0 {
            return None;
        }
        Some(self.gw_start.saturating_add(self.horizon - 1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// JSON facts snapshot (teams, players, fixtures).
    pub snapshot_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub ep_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { ep_path: DEFAULT_EP_FILE.to_string() }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config
            .squad
            .validate()
            .context("Invalid [squad] section")?;
        Ok(config)
    }

    /// Config path from `SQUADSMITH_CONFIG`, else `config.toml`.
    pub fn default_path() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }
}
