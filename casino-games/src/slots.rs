//! Three-reel slots
//!
//! Each reel draws independently from the same weighted symbol set. Weights
//! sum to 100 and fall from the rarest symbol to the most common.
//!
//! | Symbol     | Weight | Triple | Double |
//! |------------|--------|--------|--------|
//! | Seven      | 1      | 100x   | 15x    |
//! | Diamond    | 2      | 50x    | 10x    |
//! | Crown      | 4      | 25x    | 5x     |
//! | Bell       | 6      | 15x    | 3x     |
//! | Star       | 8      | 10x    | 2x     |
//! | Grape      | 10     | 8x     | 1.5x   |
//! | Watermelon | 13     | 6x     | 1.25x  |
//! | Orange     | 16     | 5x     | 1x     |
//! | Lemon      | 18     | 4x     | 0.75x  |
//! | Cherry     | 22     | 3x     | 0.5x   |

use crate::{Error, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Reel symbol, rarest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// Rarest
    Seven,
    /// Diamond
    Diamond,
    /// Crown
    Crown,
    /// Bell
    Bell,
    /// Star
    Star,
    /// Grape
    Grape,
    /// Watermelon
    Watermelon,
    /// Orange
    Orange,
    /// Lemon
    Lemon,
    /// Most common
    Cherry,
}

impl Symbol {
    /// Every symbol, in weight order
    pub const ALL: [Symbol; 10] = [
        Symbol::Seven,
        Symbol::Diamond,
        Symbol::Crown,
        Symbol::Bell,
        Symbol::Star,
        Symbol::Grape,
        Symbol::Watermelon,
        Symbol::Orange,
        Symbol::Lemon,
        Symbol::Cherry,
    ];

    /// Draw weight out of 100
    pub fn weight(self) -> u32 {
        match self {
            Symbol::Seven => 1,
            Symbol::Diamond => 2,
            Symbol::Crown => 4,
            Symbol::Bell => 6,
            Symbol::Star => 8,
            Symbol::Grape => 10,
            Symbol::Watermelon => 13,
            Symbol::Orange => 16,
            Symbol::Lemon => 18,
            Symbol::Cherry => 22,
        }
    }

    /// Multiplier for three of this symbol
    pub fn triple_multiplier(self) -> Decimal {
        match self {
            Symbol::Seven => dec!(100),
            Symbol::Diamond => dec!(50),
            Symbol::Crown => dec!(25),
            Symbol::Bell => dec!(15),
            Symbol::Star => dec!(10),
            Symbol::Grape => dec!(8),
            Symbol::Watermelon => dec!(6),
            Symbol::Orange => dec!(5),
            Symbol::Lemon => dec!(4),
            Symbol::Cherry => dec!(3),
        }
    }

    /// Multiplier for exactly two of this symbol
    pub fn double_multiplier(self) -> Decimal {
        match self {
            Symbol::Seven => dec!(15),
            Symbol::Diamond => dec!(10),
            Symbol::Crown => dec!(5),
            Symbol::Bell => dec!(3),
            Symbol::Star => dec!(2),
            Symbol::Grape => dec!(1.5),
            Symbol::Watermelon => dec!(1.25),
            Symbol::Orange => dec!(1),
            Symbol::Lemon => dec!(0.75),
            Symbol::Cherry => dec!(0.5),
        }
    }
}

/// Match found on a spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotsMatch {
    /// All three reels agree
    Triple(Symbol),
    /// Exactly two reels agree
    Double(Symbol),
    /// No two reels agree
    None,
}

impl SlotsMatch {
    /// Payout multiplier applied to the bet
    pub fn multiplier(self) -> Decimal {
        match self {
            SlotsMatch::Triple(symbol) => symbol.triple_multiplier(),
            SlotsMatch::Double(symbol) => symbol.double_multiplier(),
            SlotsMatch::None => Decimal::ZERO,
        }
    }
}

/// Result of one spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotsSpin {
    /// Symbols on the three reels, left to right
    pub reels: [Symbol; 3],
}

impl SlotsSpin {
    /// Classify the spin
    pub fn matched(&self) -> SlotsMatch {
        let [a, b, c] = self.reels;
        if a == b && b == c {
            SlotsMatch::Triple(a)
        } else if a == b || a == c {
            SlotsMatch::Double(a)
        } else if b == c {
            SlotsMatch::Double(b)
        } else {
            SlotsMatch::None
        }
    }
}

/// Weighted symbol source for spins
#[derive(Debug, Clone)]
pub struct Reel {
    dist: WeightedIndex<u32>,
}

impl Reel {
    /// Reel over the fixed symbol weights
    pub fn new() -> Result<Self> {
        let dist = WeightedIndex::new(Symbol::ALL.iter().map(|s| s.weight()))
            .map_err(|e| Error::Config(format!("Invalid reel weights: {}", e)))?;
        Ok(Self { dist })
    }

    /// Draw one symbol
    pub fn symbol<R: Rng + ?Sized>(&self, rng: &mut R) -> Symbol {
        Symbol::ALL[self.dist.sample(rng)]
    }

    /// Spin all three reels
    pub fn spin<R: Rng + ?Sized>(&self, rng: &mut R) -> SlotsSpin {
        SlotsSpin {
            reels: [self.symbol(rng), self.symbol(rng), self.symbol(rng)],
        }
    }
}

/// `floor(bet * multiplier) - bet`, or `None` on overflow
pub fn net_change(bet: i64, multiplier: Decimal) -> Option<i64> {
    let payout = Decimal::from(bet).checked_mul(multiplier)?.floor().to_i64()?;
    payout.checked_sub(bet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashMap;

    fn spin(a: Symbol, b: Symbol, c: Symbol) -> SlotsSpin {
        SlotsSpin { reels: [a, b, c] }
    }

    #[test]
    fn test_weights_sum_to_100_and_decrease_in_rarity() {
        let weights: Vec<u32> = Symbol::ALL.iter().map(|s| s.weight()).collect();
        assert_eq!(weights.iter().sum::<u32>(), 100);
        assert!(weights.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_multiplier_ranges() {
        for symbol in Symbol::ALL {
            let triple = symbol.triple_multiplier();
            let double = symbol.double_multiplier();
            assert!(triple >= dec!(3) && triple <= dec!(100));
            assert!(double >= dec!(0.5) && double <= dec!(15));
            assert!(double < triple);
        }
    }

    #[test]
    fn test_match_detection() {
        use Symbol::*;
        assert_eq!(spin(Seven, Seven, Seven).matched(), SlotsMatch::Triple(Seven));
        assert_eq!(spin(Bell, Bell, Lemon).matched(), SlotsMatch::Double(Bell));
        assert_eq!(spin(Bell, Lemon, Bell).matched(), SlotsMatch::Double(Bell));
        assert_eq!(spin(Lemon, Bell, Bell).matched(), SlotsMatch::Double(Bell));
        assert_eq!(spin(Cherry, Bell, Lemon).matched(), SlotsMatch::None);
    }

    #[test]
    fn test_net_change_floors_fractional_payouts() {
        // 0.75 * 10 = 7.5 -> 7
        assert_eq!(net_change(10, Symbol::Lemon.double_multiplier()), Some(-3));
        // 0.5 * 3 = 1.5 -> 1
        assert_eq!(net_change(3, Symbol::Cherry.double_multiplier()), Some(-2));
        assert_eq!(net_change(10, Symbol::Orange.double_multiplier()), Some(0));
        assert_eq!(net_change(10, Symbol::Seven.triple_multiplier()), Some(990));
        assert_eq!(net_change(10, Decimal::ZERO), Some(-10));
    }

    #[test]
    fn test_reel_frequencies_follow_weights() {
        let reel = Reel::new().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let draws = 100_000;
        let mut counts: HashMap<Symbol, u32> = HashMap::new();
        for _ in 0..draws {
            *counts.entry(reel.symbol(&mut rng)).or_default() += 1;
        }

        for symbol in Symbol::ALL {
            let observed = *counts.get(&symbol).unwrap_or(&0) as f64 / draws as f64;
            let expected = symbol.weight() as f64 / 100.0;
            assert!(
                (observed - expected).abs() < 0.01,
                "{:?}: observed {}, expected {}",
                symbol,
                observed,
                expected
            );
        }
    }
}
