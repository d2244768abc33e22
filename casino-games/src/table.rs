//! Game table
//!
//! Validates a bet, draws, and applies the net result through the ledger. A
//! bet that the balance cannot cover is refused before any draw. The ledger's
//! conditioned debit still guards the write, so a balance drained between
//! validation and settlement surfaces as `InsufficientFunds`.

use crate::{
    dice::{self, DiceOutcome, DiceRoll},
    slots::{self, Reel, SlotsMatch, SlotsSpin},
    Error, GameConfig, Result,
};
use parking_lot::Mutex;
use points_ledger::{AccountKey, BalanceLedger, EntryReason};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;

/// Settled dice game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DicePlay {
    /// Faces rolled
    pub roll: DiceRoll,
    /// Outcome class
    pub outcome: DiceOutcome,
    /// Bet placed
    pub bet: i64,
    /// Net balance change applied
    pub net_change: i64,
    /// Balance after settlement
    pub new_balance: i64,
}

/// Settled slots game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotsPlay {
    /// Reels shown
    pub spin: SlotsSpin,
    /// Match found
    pub matched: SlotsMatch,
    /// Multiplier applied
    pub multiplier: Decimal,
    /// Bet placed
    pub bet: i64,
    /// Net balance change applied
    pub net_change: i64,
    /// Balance after settlement
    pub new_balance: i64,
}

/// Bet validation and settlement for dice and slots
#[derive(Debug)]
pub struct GameTable {
    ledger: BalanceLedger,
    config: GameConfig,
    reel: Reel,
    rng: Mutex<StdRng>,
}

impl GameTable {
    /// Table drawing from an entropy-seeded generator
    pub fn new(ledger: BalanceLedger, config: GameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ledger,
            config,
            reel: Reel::new()?,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Replace the random source
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Table limits
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Roll two dice for `bet`
    pub async fn play_dice(&self, key: &AccountKey, bet: i64) -> Result<DicePlay> {
        self.check_bet(key, bet).await?;

        let roll = DiceRoll::draw(&mut *self.rng.lock());
        let outcome = roll.outcome();
        let net_change = dice::net_change(bet, outcome.multiplier())
            .ok_or_else(|| Error::InvalidBet(format!("Payout for bet {} overflows", bet)))?;

        let settled = self
            .ledger
            .apply_delta(key, net_change, EntryReason::Dice)
            .await?;

        tracing::info!(
            account = %key,
            bet,
            first = roll.first,
            second = roll.second,
            outcome = ?outcome,
            net_change,
            balance = settled.new_balance,
            "Dice settled"
        );

        Ok(DicePlay {
            roll,
            outcome,
            bet,
            net_change,
            new_balance: settled.new_balance,
        })
    }

    /// Spin the slots for `bet`
    pub async fn play_slots(&self, key: &AccountKey, bet: i64) -> Result<SlotsPlay> {
        self.check_bet(key, bet).await?;

        let spin = self.reel.spin(&mut *self.rng.lock());
        let matched = spin.matched();
        let multiplier = matched.multiplier();
        let net_change = slots::net_change(bet, multiplier)
            .ok_or_else(|| Error::InvalidBet(format!("Payout for bet {} overflows", bet)))?;

        let settled = self
            .ledger
            .apply_delta(key, net_change, EntryReason::Slots)
            .await?;

        tracing::info!(
            account = %key,
            bet,
            reels = ?spin.reels,
            %multiplier,
            net_change,
            balance = settled.new_balance,
            "Slots settled"
        );

        Ok(SlotsPlay {
            spin,
            matched,
            multiplier,
            bet,
            net_change,
            new_balance: settled.new_balance,
        })
    }

    async fn check_bet(&self, key: &AccountKey, bet: i64) -> Result<()> {
        self.config.check_bet(bet)?;
        let balance = self.ledger.balance(key).await?;
        if bet > balance {
            tracing::debug!(account = %key, bet, balance, "Bet refused before draw");
            return Err(Error::BetExceedsBalance { bet, balance });
        }
        Ok(())
    }
}
