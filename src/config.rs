//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section falls back to its defaults, so a partial file (or an empty one)
//! is valid.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::data::demand::DemandConfig;
use crate::engine::refresh::RefreshConfig;
use crate::pricing::OptimizerConfig;
use crate::types::PricingError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub optimizer: OptimizerConfig,
    pub demand: DemandConfig,
    pub refresh: RefreshConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    /// JSON file with historical market rows.
    pub dataset_path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "pricing-engine".to_string(),
            dataset_path: PathBuf::from("data/market_data.json"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the optimizer or refresh loop cannot work with.
    pub fn validate(&self) -> Result<(), PricingError> {
        self.optimizer.validate()?;
        self.demand.validate()?;
        self.refresh.validate()
    }
}
