//! Node configuration
//!
//! One TOML file with a section per engine. Every field has a default, so a
//! missing file or a partial one still yields a runnable node. Environment
//! overrides apply on top of the file.

use anyhow::{bail, Context, Result};
use awards::{AwardsConfig, Question};
use casino_games::GameConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use withdraw_limits::WithdrawalLimitConfig;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "ECONOMY_CONFIG";

/// Full node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Ledger store and metrics
    pub ledger: points_ledger::Config,

    /// Weekly withdrawal caps
    pub limits: WithdrawalLimitConfig,

    /// Table limits
    pub games: GameConfig,

    /// Awarders
    pub awards: AwardsConfig,

    /// Trivia question pool
    pub questions: Vec<Question>,

    /// Log output
    pub log: LogConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            ledger: points_ledger::Config::default(),
            limits: WithdrawalLimitConfig::default(),
            games: GameConfig::default(),
            awards: AwardsConfig::default(),
            questions: vec![
                Question {
                    prompt: "How many sides does a standard die have?".to_string(),
                    answer: "6".to_string(),
                },
                Question {
                    prompt: "What is 7 x 8?".to_string(),
                    answer: "56".to_string(),
                },
            ],
            log: LogConfig::default(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,

    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl NodeConfig {
    /// Parse from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse node config")
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// File named by `ECONOMY_CONFIG` (defaults otherwise), then env overrides
    pub fn load() -> Result<Self> {
        let config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.with_env()
    }

    /// Apply environment overrides and validate
    pub fn with_env(mut self) -> Result<Self> {
        self.ledger = self.ledger.apply_env()?;
        self.validate()?;
        Ok(self)
    }

    /// Reject settings the engines cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.limits.weekly_cap < 0 || self.limits.global_weekly_cap < 0 {
            bail!("limits caps must not be negative");
        }
        if self.limits.window_secs <= 0 {
            bail!("limits.window_secs must be positive");
        }
        if self.ledger.store.mailbox_capacity == 0 {
            bail!("ledger.store.mailbox_capacity must be positive");
        }
        self.games.validate()?;
        self.awards.validate()?;
        if self.questions.is_empty() {
            bail!("at least one trivia question is required");
        }
        Ok(())
    }
}
