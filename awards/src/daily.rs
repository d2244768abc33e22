//! Daily role pay
//!
//! An account holding one or more paying roles is paid once per cooldown,
//! at the rate of its best-paying role. The claim is a conditioned update on
//! `last_daily_role_pay_at`; the credit follows only for the winner.

use crate::{DailyPayConfig, Error, Result};
use points_ledger::{AccountKey, AccountUpdate, BalanceLedger, Clock, EntryReason};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Role name to daily payout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePayTable {
    rates: BTreeMap<String, i64>,
}

impl RolePayTable {
    /// Table from role rates
    pub fn new(rates: BTreeMap<String, i64>) -> Self {
        Self { rates }
    }

    /// Best-paying role among `roles`. Ties go to the role name sorting first.
    pub fn best<'a>(&'a self, roles: &[String]) -> Option<(&'a str, i64)> {
        self.rates
            .iter()
            .filter(|(role, _)| roles.iter().any(|held| held == *role))
            .fold(None, |best: Option<(&'a str, i64)>, (role, amount)| match best {
                Some((_, top)) if top >= *amount => best,
                _ => Some((role.as_str(), *amount)),
            })
    }
}

/// Outcome of a daily pay attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyPayOutcome {
    /// Account was paid
    Paid {
        /// Role the rate came from
        role: String,
        /// Points credited
        amount: i64,
        /// Balance after the credit
        new_balance: i64,
    },
    /// Already paid inside the cooldown (or a concurrent trigger won)
    AlreadyPaid,
    /// None of the account's roles pay
    NoPayingRole,
}

/// Daily role pay awarder
#[derive(Clone)]
pub struct DailyRolePay {
    ledger: BalanceLedger,
    clock: Arc<dyn Clock>,
    table: RolePayTable,
    cooldown_secs: i64,
}

impl std::fmt::Debug for DailyRolePay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyRolePay")
            .field("table", &self.table)
            .field("cooldown_secs", &self.cooldown_secs)
            .finish_non_exhaustive()
    }
}

impl DailyRolePay {
    /// Create awarder from config
    pub fn new(ledger: BalanceLedger, clock: Arc<dyn Clock>, config: &DailyPayConfig) -> Self {
        Self {
            ledger,
            clock,
            table: RolePayTable::new(config.roles.clone()),
            cooldown_secs: config.cooldown_secs,
        }
    }

    /// Pay `key` for the best of `roles`, at most once per cooldown
    pub async fn pay(&self, key: &AccountKey, roles: &[String]) -> Result<DailyPayOutcome> {
        let Some((role, amount)) = self.table.best(roles) else {
            return Ok(DailyPayOutcome::NoPayingRole);
        };

        let claim = AccountUpdate::ClaimDailyPay {
            now: self.clock.now(),
            cooldown_secs: self.cooldown_secs,
        };
        let metrics = self.ledger.metrics();
        if self
            .ledger
            .store()
            .find_one_and_update(key, claim, true)
            .await?
            .is_none()
        {
            metrics.record_claim(false);
            tracing::debug!(account = %key, "Daily role pay already claimed");
            return Ok(DailyPayOutcome::AlreadyPaid);
        }
        metrics.record_claim(true);

        match self
            .ledger
            .apply_delta(key, amount, EntryReason::DailyRolePay)
            .await
        {
            Ok(outcome) => {
                tracing::info!(account = %key, role, amount, "Daily role pay credited");
                Ok(DailyPayOutcome::Paid {
                    role: role.to_string(),
                    amount,
                    new_balance: outcome.new_balance,
                })
            }
            Err(e) => {
                tracing::error!(
                    target: "reconciliation",
                    account = %key,
                    role,
                    amount,
                    error = %e,
                    "Daily pay claimed but credit failed"
                );
                Err(Error::Ledger(e))
            }
        }
    }
}
