//! Table limits

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Bet limits shared by every game on a table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Smallest accepted bet
    pub min_bet: i64,

    /// Largest accepted bet (`None` = bounded by balance only)
    pub max_bet: Option<i64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_bet: 1,
            max_bet: None,
        }
    }
}

impl GameConfig {
    /// Reject limits no bet could satisfy
    pub fn validate(&self) -> Result<()> {
        if self.min_bet <= 0 {
            return Err(Error::Config(format!(
                "min_bet must be positive, got {}",
                self.min_bet
            )));
        }
        if let Some(max_bet) = self.max_bet {
            if max_bet < self.min_bet {
                return Err(Error::Config(format!(
                    "max_bet {} is below min_bet {}",
                    max_bet, self.min_bet
                )));
            }
        }
        Ok(())
    }

    /// Check a bet against the table limits
    pub fn check_bet(&self, bet: i64) -> Result<()> {
        if bet <= 0 {
            return Err(Error::InvalidBet(format!("Bet must be positive, got {}", bet)));
        }
        if bet < self.min_bet {
            return Err(Error::InvalidBet(format!(
                "Minimum bet is {}, got {}",
                self.min_bet, bet
            )));
        }
        match self.max_bet {
            Some(max_bet) if bet > max_bet => Err(Error::InvalidBet(format!(
                "Maximum bet is {}, got {}",
                max_bet, bet
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_accepts_any_positive_bet() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.check_bet(1).is_ok());
        assert!(config.check_bet(i64::MAX).is_ok());
        assert!(matches!(config.check_bet(0), Err(Error::InvalidBet(_))));
    }

    #[test]
    fn test_bounds() {
        let config = GameConfig {
            min_bet: 10,
            max_bet: Some(500),
        };
        assert!(config.check_bet(9).is_err());
        assert!(config.check_bet(10).is_ok());
        assert!(config.check_bet(500).is_ok());
        assert!(config.check_bet(501).is_err());
    }

    #[test]
    fn test_inverted_limits_rejected() {
        let config = GameConfig {
            min_bet: 100,
            max_bet: Some(50),
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
