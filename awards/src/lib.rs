//! Idempotent event awarders
//!
//! Daily role pay, point drops and chat trivia all follow one pattern: win a
//! single-winner claim first, then credit through the ledger. Losers of the
//! claim get a silent no-op outcome, never an error.
//!
//! Events that live between a trigger and its resolution (an open drop, an
//! asked question) sit in an [`ActiveRegistry`] owned by the awarder, so
//! resolution and expiry race on one atomic removal.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod config;
pub mod registry;
pub mod daily;
pub mod drops;
pub mod trivia;

pub use error::{Error, Result};
pub use config::{AwardsConfig, DailyPayConfig, DropConfig, TriviaConfig};
pub use registry::ActiveRegistry;
pub use daily::{DailyPayOutcome, DailyRolePay, RolePayTable};
pub use drops::{ActiveDrop, DropClaim, PointDrops};
pub use trivia::{
    ActiveQuestion, Question, QuestionSource, StaticQuestions, Trivia, TriviaAnswer,
    TriviaPrompt,
};
