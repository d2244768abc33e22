//! Weekly withdrawal limit checking
//!
//! Both gates use the same discipline as one conditioned store update:
//! reset an expired window, check `used + amount <= cap`, reserve. The
//! account gate and the global gate are independent entities with no
//! shared transaction, so [`WithdrawalLimiter::reserve_both`] undoes the
//! account reservation when the global gate refuses.

use crate::{DualReservation, Error, Reservation, Result, WithdrawalLimitConfig};
use points_ledger::update::current_window;
use points_ledger::{
    Account, AccountKey, AccountUpdate, Clock, GlobalUpdate, ProfileStore, ServerId,
};
use std::sync::Arc;

/// Limit checker
pub struct WithdrawalLimiter {
    store: Arc<dyn ProfileStore>,
    clock: Arc<dyn Clock>,
    config: WithdrawalLimitConfig,
}

impl WithdrawalLimiter {
    /// Create new limit checker
    pub fn new(
        store: Arc<dyn ProfileStore>,
        clock: Arc<dyn Clock>,
        config: WithdrawalLimitConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Limit configuration
    pub fn config(&self) -> &WithdrawalLimitConfig {
        &self.config
    }

    /// Reserve `amount` of the account's weekly quota.
    ///
    /// `amount = 0` reserves nothing but still rolls an expired window, which
    /// is how callers get an up-to-date remaining figure.
    pub async fn check_and_reserve(&self, key: &AccountKey, amount: i64) -> Result<Reservation> {
        check_amount(amount)?;
        let now = self.clock.now();
        let cap = self.config.weekly_cap;
        let update = AccountUpdate::ReserveWithdrawal {
            amount,
            cap,
            now,
            window_secs: self.config.window_secs,
        };

        let reservation = match self.store.find_one_and_update(key, update, true).await? {
            Some(account) => self.reservation(
                true,
                cap,
                account.weekly_withdraw_amount,
                account.first_withdraw_at,
            ),
            None => {
                let account = self
                    .store
                    .find_one(key)
                    .await?
                    .unwrap_or_else(|| Account::new(key.clone()));
                let (used, start) = current_window(
                    account.weekly_withdraw_amount,
                    account.first_withdraw_at,
                    now,
                    self.config.window_secs,
                );
                self.reservation(false, cap, used, start)
            }
        };

        tracing::debug!(
            account = %key,
            amount,
            allowed = reservation.allowed,
            remaining = reservation.remaining,
            "Account withdrawal check"
        );
        Ok(reservation)
    }

    /// Reserve `amount` of the global weekly quota for `scope`
    pub async fn check_and_reserve_global(
        &self,
        scope: &Option<ServerId>,
        amount: i64,
    ) -> Result<Reservation> {
        check_amount(amount)?;
        let now = self.clock.now();
        let cap = self.config.global_weekly_cap;
        let update = GlobalUpdate::Reserve {
            amount,
            cap,
            now,
            window_secs: self.config.window_secs,
        };

        let reservation = match self.store.update_global(scope, update).await? {
            Some(state) => self.reservation(
                true,
                cap,
                state.total_withdrawn_this_week,
                state.week_start_at,
            ),
            None => {
                let state = self.store.find_global(scope).await?;
                let (used, start) = current_window(
                    state.total_withdrawn_this_week,
                    state.week_start_at,
                    now,
                    self.config.window_secs,
                );
                self.reservation(false, cap, used, start)
            }
        };

        tracing::debug!(
            scope = ?scope,
            amount,
            allowed = reservation.allowed,
            remaining = reservation.remaining,
            "Global withdrawal check"
        );
        Ok(reservation)
    }

    /// Reserve against both gates, leaving neither reserved unless both allow
    pub async fn reserve_both(&self, key: &AccountKey, amount: i64) -> Result<DualReservation> {
        let account = self.check_and_reserve(key, amount).await?;
        if !account.allowed {
            let global = self.check_and_reserve_global(&key.server_id, 0).await?;
            return Ok(DualReservation {
                account,
                global: Reservation {
                    allowed: false,
                    ..global
                },
            });
        }

        let global = match self.check_and_reserve_global(&key.server_id, amount).await {
            Ok(global) => global,
            Err(e) => {
                self.rollback(key, amount).await;
                return Err(e);
            }
        };

        if global.allowed {
            return Ok(DualReservation { account, global });
        }

        self.rollback(key, amount).await;
        let account = self.check_and_reserve(key, 0).await?;
        Ok(DualReservation {
            account: Reservation {
                allowed: false,
                ..account
            },
            global,
        })
    }

    /// Return previously reserved account quota (e.g. the outflow failed)
    pub async fn release(&self, key: &AccountKey, amount: i64) -> Result<Reservation> {
        check_amount(amount)?;
        let now = self.clock.now();
        let cap = self.config.weekly_cap;
        let update = AccountUpdate::ReserveWithdrawal {
            amount: -amount,
            cap,
            now,
            window_secs: self.config.window_secs,
        };

        match self.store.find_one_and_update(key, update, true).await? {
            Some(account) => Ok(self.reservation(
                true,
                cap,
                account.weekly_withdraw_amount,
                account.first_withdraw_at,
            )),
            None => Err(Error::Unavailable(format!("Release refused for {}", key))),
        }
    }

    /// Return previously reserved global quota
    pub async fn release_global(&self, scope: &Option<ServerId>, amount: i64) -> Result<Reservation> {
        check_amount(amount)?;
        let cap = self.config.global_weekly_cap;
        let update = GlobalUpdate::Reserve {
            amount: -amount,
            cap,
            now: self.clock.now(),
            window_secs: self.config.window_secs,
        };

        match self.store.update_global(scope, update).await? {
            Some(state) => Ok(self.reservation(
                true,
                cap,
                state.total_withdrawn_this_week,
                state.week_start_at,
            )),
            None => Err(Error::Unavailable(format!("Global release refused for {:?}", scope))),
        }
    }

    /// Account quota as of now, without reserving anything
    pub async fn quota(&self, key: &AccountKey) -> Result<Reservation> {
        self.check_and_reserve(key, 0).await
    }

    async fn rollback(&self, key: &AccountKey, amount: i64) {
        if let Err(e) = self.release(key, amount).await {
            tracing::error!(
                account = %key,
                amount,
                error = %e,
                "Failed to roll back account withdrawal reservation"
            );
        }
    }

    fn reservation(&self, allowed: bool, cap: i64, used: i64, window_start: i64) -> Reservation {
        Reservation {
            allowed,
            remaining: (cap - used).max(0),
            used,
            window_resets_at: window_start + self.config.window_secs,
        }
    }
}

fn check_amount(amount: i64) -> Result<()> {
    if amount < 0 {
        return Err(Error::InvalidAmount(format!(
            "Withdrawal amount cannot be negative, got {}",
            amount
        )));
    }
    Ok(())
}
