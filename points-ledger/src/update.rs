//! Conditioned update language
//!
//! Every check-then-mutate in the economy is one of these variants. A store
//! applies the variant inside its atomic section and persists the result only
//! when [`AccountUpdate::apply`] returns `true`; a `false` is a lost race or an
//! unmet precondition, reported to the caller as `None`.

use crate::types::{Account, EntryReason, GlobalWithdrawState, LedgerEntry};
use serde::{Deserialize, Serialize};

/// Conditioned mutation of a single account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountUpdate {
    /// `balance += delta` where the result stays non-negative
    AdjustBalance {
        /// Signed change
        delta: i64,
        /// Journal reason
        reason: EntryReason,
    },

    /// Reserve weekly withdrawal quota, resetting an expired window first
    ReserveWithdrawal {
        /// Points to reserve (negative releases a previous reservation)
        amount: i64,
        /// Weekly cap
        cap: i64,
        /// Current time (epoch seconds)
        now: i64,
        /// Window length in seconds
        window_secs: i64,
    },

    /// Take the once-per-cooldown daily role pay marker
    ClaimDailyPay {
        /// Current time (epoch seconds)
        now: i64,
        /// Minimum seconds between payouts
        cooldown_secs: i64,
    },

    /// Count one chat message toward the next trivia prompt
    RecordChatMessage,

    /// Take the right to ask a trivia question
    ClaimTrivia {
        /// Current time (epoch seconds)
        now: i64,
        /// Messages required since the last prompt
        message_threshold: u32,
        /// Seconds before the next prompt may be asked
        cooldown_secs: i64,
    },
}

impl AccountUpdate {
    /// Apply to `account` if the precondition holds. Leaves `account`
    /// untouched and returns `false` otherwise.
    pub fn apply(&self, account: &mut Account) -> bool {
        match self {
            AccountUpdate::AdjustBalance { delta, .. } => {
                match account.balance.checked_add(*delta) {
                    Some(next) if next >= 0 => {
                        account.balance = next;
                        true
                    }
                    _ => false,
                }
            }

            AccountUpdate::ReserveWithdrawal {
                amount,
                cap,
                now,
                window_secs,
            } => {
                let (used, window_start) = current_window(
                    account.weekly_withdraw_amount,
                    account.first_withdraw_at,
                    *now,
                    *window_secs,
                );
                let next = match used.checked_add(*amount) {
                    Some(next) => next.max(0),
                    None => return false,
                };
                if *amount > 0 && next > *cap {
                    return false;
                }
                account.weekly_withdraw_amount = next;
                account.first_withdraw_at = window_start;
                true
            }

            AccountUpdate::ClaimDailyPay { now, cooldown_secs } => {
                let last = account.last_daily_role_pay_at;
                if last != 0 && now - last < *cooldown_secs {
                    return false;
                }
                account.last_daily_role_pay_at = *now;
                true
            }

            AccountUpdate::RecordChatMessage => {
                account.messages_since_last_trivia =
                    account.messages_since_last_trivia.saturating_add(1);
                true
            }

            AccountUpdate::ClaimTrivia {
                now,
                message_threshold,
                cooldown_secs,
            } => {
                if account.messages_since_last_trivia < *message_threshold
                    || *now < account.next_trivia_available_at
                {
                    return false;
                }
                account.messages_since_last_trivia = 0;
                account.next_trivia_available_at = now + cooldown_secs;
                true
            }
        }
    }

    /// Journal row for an applied update, if it moved the balance
    pub fn journal_entry(&self, account: &Account) -> Option<LedgerEntry> {
        match self {
            AccountUpdate::AdjustBalance { delta, reason } => {
                Some(LedgerEntry::record(account, *delta, reason.clone()))
            }
            _ => None,
        }
    }

    /// Whether the update only adds points (safe to apply to a fresh account)
    pub fn is_credit(&self) -> bool {
        matches!(self, AccountUpdate::AdjustBalance { delta, .. } if *delta >= 0)
    }
}

/// Conditioned mutation of a [`GlobalWithdrawState`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalUpdate {
    /// Reserve global weekly quota, resetting an expired window first
    Reserve {
        /// Points to reserve (negative releases)
        amount: i64,
        /// Global weekly cap
        cap: i64,
        /// Current time (epoch seconds)
        now: i64,
        /// Window length in seconds
        window_secs: i64,
    },
}

impl GlobalUpdate {
    /// Apply to `state` if the precondition holds
    pub fn apply(&self, state: &mut GlobalWithdrawState) -> bool {
        match self {
            GlobalUpdate::Reserve {
                amount,
                cap,
                now,
                window_secs,
            } => {
                let (used, window_start) = current_window(
                    state.total_withdrawn_this_week,
                    state.week_start_at,
                    *now,
                    *window_secs,
                );
                let next = match used.checked_add(*amount) {
                    Some(next) => next.max(0),
                    None => return false,
                };
                if *amount > 0 && next > *cap {
                    return false;
                }
                state.total_withdrawn_this_week = next;
                state.week_start_at = window_start;
                true
            }
        }
    }
}

/// Amount used and window start as of `now`. An unset or expired window
/// reads as empty and starting `now`.
pub fn current_window(used: i64, window_start: i64, now: i64, window_secs: i64) -> (i64, i64) {
    if window_start == 0 || now - window_start >= window_secs {
        (0, now)
    } else {
        (used, window_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountKey;

    const WEEK: i64 = 7 * 24 * 3600;

    fn account() -> Account {
        Account::new(AccountKey::global("alice"))
    }

    #[test]
    fn test_adjust_balance_rejects_overdraft() {
        let mut acc = account();
        acc.balance = 10;

        let debit = AccountUpdate::AdjustBalance {
            delta: -11,
            reason: EntryReason::Adjustment,
        };
        assert!(!debit.apply(&mut acc));
        assert_eq!(acc.balance, 10);

        let debit = AccountUpdate::AdjustBalance {
            delta: -10,
            reason: EntryReason::Adjustment,
        };
        assert!(debit.apply(&mut acc));
        assert_eq!(acc.balance, 0);
    }

    #[test]
    fn test_adjust_balance_overflow_rejected() {
        let mut acc = account();
        acc.balance = i64::MAX;
        let credit = AccountUpdate::AdjustBalance {
            delta: 1,
            reason: EntryReason::Adjustment,
        };
        assert!(!credit.apply(&mut acc));
    }

    #[test]
    fn test_reserve_withdrawal_opens_window() {
        let mut acc = account();
        let reserve = AccountUpdate::ReserveWithdrawal {
            amount: 400,
            cap: 1000,
            now: 5_000,
            window_secs: WEEK,
        };
        assert!(reserve.apply(&mut acc));
        assert_eq!(acc.weekly_withdraw_amount, 400);
        assert_eq!(acc.first_withdraw_at, 5_000);
    }

    #[test]
    fn test_reserve_withdrawal_resets_expired_window() {
        let mut acc = account();
        acc.weekly_withdraw_amount = 1000;
        acc.first_withdraw_at = 1_000;

        let reserve = AccountUpdate::ReserveWithdrawal {
            amount: 900,
            cap: 1000,
            now: 1_000 + WEEK,
            window_secs: WEEK,
        };
        assert!(reserve.apply(&mut acc));
        assert_eq!(acc.weekly_withdraw_amount, 900);
        assert_eq!(acc.first_withdraw_at, 1_000 + WEEK);
    }

    #[test]
    fn test_release_never_goes_below_zero() {
        let mut acc = account();
        acc.weekly_withdraw_amount = 100;
        acc.first_withdraw_at = 10;
        let release = AccountUpdate::ReserveWithdrawal {
            amount: -500,
            cap: 1000,
            now: 20,
            window_secs: WEEK,
        };
        assert!(release.apply(&mut acc));
        assert_eq!(acc.weekly_withdraw_amount, 0);
    }

    #[test]
    fn test_daily_claim_once_per_cooldown() {
        let mut acc = account();
        let claim = AccountUpdate::ClaimDailyPay {
            now: 100_000,
            cooldown_secs: 86_400,
        };
        assert!(claim.apply(&mut acc));
        assert!(!claim.apply(&mut acc));

        let later = AccountUpdate::ClaimDailyPay {
            now: 100_000 + 86_400,
            cooldown_secs: 86_400,
        };
        assert!(later.apply(&mut acc));
    }

    #[test]
    fn test_trivia_claim_needs_threshold_and_cooldown() {
        let mut acc = account();
        let claim = AccountUpdate::ClaimTrivia {
            now: 1_000,
            message_threshold: 3,
            cooldown_secs: 600,
        };

        for _ in 0..2 {
            AccountUpdate::RecordChatMessage.apply(&mut acc);
        }
        assert!(!claim.apply(&mut acc));

        AccountUpdate::RecordChatMessage.apply(&mut acc);
        assert!(claim.apply(&mut acc));
        assert_eq!(acc.messages_since_last_trivia, 0);
        assert_eq!(acc.next_trivia_available_at, 1_600);

        for _ in 0..3 {
            AccountUpdate::RecordChatMessage.apply(&mut acc);
        }
        assert!(!claim.apply(&mut acc));
    }

    #[test]
    fn test_global_reserve_respects_cap() {
        let mut state = GlobalWithdrawState::new(None);
        let reserve = |amount| GlobalUpdate::Reserve {
            amount,
            cap: 500,
            now: 50,
            window_secs: WEEK,
        };
        assert!(reserve(300).apply(&mut state));
        assert!(!reserve(300).apply(&mut state));
        assert_eq!(state.total_withdrawn_this_week, 300);
        assert_eq!(state.week_start_at, 50);
    }
}
