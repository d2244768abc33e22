//! Awarder configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All awarder settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AwardsConfig {
    /// Daily role pay
    pub daily: DailyPayConfig,

    /// Point drops
    pub drops: DropConfig,

    /// Chat trivia
    pub trivia: TriviaConfig,
}

impl AwardsConfig {
    /// Reject settings that would pay nothing or never expire
    pub fn validate(&self) -> Result<()> {
        if self.daily.cooldown_secs <= 0 {
            return Err(Error::Config("daily.cooldown_secs must be positive".into()));
        }
        if let Some((role, amount)) = self.daily.roles.iter().find(|(_, amount)| **amount <= 0) {
            return Err(Error::Config(format!(
                "daily.roles.{} pays {}, must be positive",
                role, amount
            )));
        }
        if self.drops.amount <= 0 || self.drops.window_secs <= 0 || self.drops.interval_secs == 0 {
            return Err(Error::Config(
                "drops.amount, drops.window_secs and drops.interval_secs must be positive".into(),
            ));
        }
        if self.trivia.reward <= 0 || self.trivia.answer_window_secs <= 0 {
            return Err(Error::Config(
                "trivia.reward and trivia.answer_window_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Daily role pay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyPayConfig {
    /// Minimum seconds between payouts to one account
    pub cooldown_secs: i64,

    /// Points paid per role name
    pub roles: BTreeMap<String, i64>,
}

impl Default for DailyPayConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 24 * 60 * 60,
            roles: BTreeMap::new(),
        }
    }
}

/// Point drop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DropConfig {
    /// Points awarded to the winner
    pub amount: i64,

    /// Seconds a drop stays claimable
    pub window_secs: i64,

    /// Seconds between scheduled drops
    pub interval_secs: u64,

    /// Message that claims a drop (case-insensitive)
    pub claim_phrase: String,

    /// Channels that receive scheduled drops
    pub channels: Vec<String>,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            amount: 100,
            window_secs: 60,
            interval_secs: 60 * 60,
            claim_phrase: "claim".to_string(),
            channels: Vec::new(),
        }
    }
}

/// Chat trivia settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriviaConfig {
    /// Messages an account must send before a question is asked
    pub message_threshold: u32,

    /// Seconds between questions for one account
    pub cooldown_secs: i64,

    /// Points for a correct answer
    pub reward: i64,

    /// Seconds to answer
    pub answer_window_secs: i64,
}

impl Default for TriviaConfig {
    fn default() -> Self {
        Self {
            message_threshold: 25,
            cooldown_secs: 15 * 60,
            reward: 50,
            answer_window_secs: 30,
        }
    }
}
