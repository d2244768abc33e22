//! Two-dice game
//!
//! Outcome classes, checked in this order:
//! - Doubles: 2x
//! - Sum of 7: 2x
//! - Sum of 8 or more: 1x (bet returned)
//! - Anything else: 0x

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Classified roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiceOutcome {
    /// Both dice show the same face
    Doubles,
    /// Faces sum to 7
    Seven,
    /// Faces sum to 8 or more
    High,
    /// Everything else
    Low,
}

impl DiceOutcome {
    /// Payout multiplier applied to the bet
    pub fn multiplier(self) -> i64 {
        match self {
            DiceOutcome::Doubles | DiceOutcome::Seven => 2,
            DiceOutcome::High => 1,
            DiceOutcome::Low => 0,
        }
    }
}

/// Two dice, each in 1..=6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    /// First die
    pub first: u8,
    /// Second die
    pub second: u8,
}

impl DiceRoll {
    /// Roll two independent fair dice
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            first: rng.gen_range(1..=6),
            second: rng.gen_range(1..=6),
        }
    }

    /// Sum of both faces
    pub fn total(&self) -> u8 {
        self.first + self.second
    }

    /// Classify the roll
    pub fn outcome(&self) -> DiceOutcome {
        if self.first == self.second {
            DiceOutcome::Doubles
        } else if self.total() == 7 {
            DiceOutcome::Seven
        } else if self.total() >= 8 {
            DiceOutcome::High
        } else {
            DiceOutcome::Low
        }
    }
}

/// `bet * multiplier - bet`, or `None` on overflow
pub fn net_change(bet: i64, multiplier: i64) -> Option<i64> {
    bet.checked_mul(multiplier)?.checked_sub(bet)
}
