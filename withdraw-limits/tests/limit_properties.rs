//! Property-based tests for the weekly withdrawal windows
//!
//! - Reserved quota never exceeds the cap inside one window
//! - A reservation is allowed exactly when it fits the remaining quota
//! - Concurrent reservations cannot jointly overshoot the cap

use points_ledger::{AccountKey, ManualClock, MemoryStore};
use proptest::prelude::*;
use std::sync::Arc;
use withdraw_limits::{WithdrawalLimitConfig, WithdrawalLimiter, WEEK_SECS};

fn create_test_limiter(clock: Arc<ManualClock>, weekly_cap: i64) -> WithdrawalLimiter {
    WithdrawalLimiter::new(
        Arc::new(MemoryStore::new()),
        clock,
        WithdrawalLimitConfig {
            weekly_cap,
            global_weekly_cap: i64::MAX / 2,
            window_secs: WEEK_SECS,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: allowed iff `used + amount <= cap`, and `used` only moves on allow
    #[test]
    fn prop_reservations_respect_cap(
        cap in 1i64..5_000,
        amounts in prop::collection::vec(0i64..2_000, 1..30),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let limiter = create_test_limiter(Arc::new(ManualClock::new(1_000)), cap);
            let key = AccountKey::global("alice");
            let mut used = 0i64;

            for amount in amounts {
                let reservation = limiter.check_and_reserve(&key, amount).await.unwrap();
                prop_assert_eq!(reservation.allowed, used + amount <= cap);
                if reservation.allowed {
                    used += amount;
                }
                prop_assert_eq!(reservation.used, used);
                prop_assert_eq!(reservation.remaining, cap - used);
            }
            Ok(())
        })?;
    }

    /// Property: once a full window has elapsed, any amount up to the cap fits
    #[test]
    fn prop_window_expiry_restores_full_quota(
        first in 1i64..1_000,
        elapsed in WEEK_SECS..(4 * WEEK_SECS),
        second in 1i64..=1_000,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let clock = Arc::new(ManualClock::new(50_000));
            let limiter = create_test_limiter(clock.clone(), 1_000);
            let key = AccountKey::scoped("guild", "alice");

            prop_assert!(limiter.check_and_reserve(&key, first).await.unwrap().allowed);
            clock.advance(elapsed);

            let reservation = limiter.check_and_reserve(&key, second).await.unwrap();
            prop_assert!(reservation.allowed);
            prop_assert_eq!(reservation.used, second);
            Ok(())
        })?;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_never_overshoot() {
    let limiter = Arc::new(create_test_limiter(Arc::new(ManualClock::new(1_000)), 1_000));
    let key = AccountKey::global("alice");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let limiter = limiter.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            limiter.check_and_reserve(&key, 150).await.unwrap().allowed
        }));
    }

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            allowed += 1;
        }
    }

    assert_eq!(allowed, 6);
    assert_eq!(limiter.quota(&key).await.unwrap().used, 900);
}
