//! Casino games for the points economy
//!
//! Dice and slots are pure outcome engines: a random draw plus a bet maps to a
//! multiplier and a net balance change. [`GameTable`] validates the bet against
//! the player's balance before drawing and applies the net change through the
//! ledger.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod config;
pub mod dice;
pub mod slots;
pub mod table;

pub use error::{Error, Result};
pub use config::GameConfig;
pub use dice::{DiceOutcome, DiceRoll};
pub use slots::{Reel, SlotsMatch, SlotsSpin, Symbol};
pub use table::{DicePlay, GameTable, SlotsPlay};
