//! Configuration for the motive agent.
//!
//! JSON on disk under `~/.motive/config.json`: backend credentials and
//! the iteration budgets governing planning and execution.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod paths;

pub use paths::{config_path, data_dir};

/// Configuration failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Reasoning backend credentials and model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: default_model(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

/// Budgets for the executor, the dispatcher and the search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Executed actions plus re-planning rounds before a run fails.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Backend turns available to a single delegation.
    #[serde(default = "default_delegation_max_iterations")]
    pub delegation_max_iterations: u32,
    /// Node expansions available to a single planning call.
    #[serde(default = "default_max_expansions")]
    pub max_expansions: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            delegation_max_iterations: default_delegation_max_iterations(),
            max_expansions: default_max_expansions(),
        }
    }
}

fn default_max_iterations() -> u32 {
    20
}

fn default_delegation_max_iterations() -> u32 {
    8
}

fn default_max_expansions() -> usize {
    10_000
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

impl Config {
    /// Load from the default location; absent file yields defaults.
    pub async fn load() -> Result<Self> {
        Self::load_from(&config_path()).await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config found, using defaults");
            return Ok(Config::default());
        }

        debug!(path = %path.display(), "loading config");
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location.
    pub async fn save(&self) -> Result<()> {
        self.save_to(&config_path()).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Write a default config file unless one already exists. Returns
    /// whether a file was created.
    pub async fn init() -> Result<bool> {
        let path = config_path();
        if path.exists() {
            return Ok(false);
        }
        Config::default().save_to(&path).await?;
        Ok(true)
    }
}
