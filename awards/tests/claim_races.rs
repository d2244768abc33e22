//! Concurrent triggers against one awardable event
//!
//! Every race here must end with exactly one credit reaching the ledger and
//! every other contender observing a no-op.

use awards::{
    DailyPayConfig, DailyPayOutcome, DailyRolePay, DropClaim, DropConfig, PointDrops, Question,
    StaticQuestions, Trivia, TriviaAnswer, TriviaConfig,
};
use points_ledger::notifier::NotifyError;
use points_ledger::{
    AccountKey, BalanceChanged, BalanceLedger, BalanceObserver, ManualClock, MemoryStore,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts credits the ledger commits
#[derive(Default)]
struct CreditCounter {
    credits: AtomicUsize,
}

impl BalanceObserver for CreditCounter {
    fn balance_changed(&self, event: BalanceChanged) -> Result<(), NotifyError> {
        if event.delta > 0 {
            self.credits.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

fn counted_ledger() -> (BalanceLedger, Arc<CreditCounter>) {
    let counter = Arc::new(CreditCounter::default());
    let ledger = BalanceLedger::new(Arc::new(MemoryStore::new())).with_observer(counter.clone());
    (ledger, counter)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_daily_pay_two_triggers_one_credit() {
    let (ledger, counter) = counted_ledger();
    let config = DailyPayConfig {
        roles: [("member".to_string(), 75)].into_iter().collect(),
        ..DailyPayConfig::default()
    };
    let awarder = DailyRolePay::new(ledger.clone(), Arc::new(ManualClock::new(1_000_000)), &config);
    let key = AccountKey::scoped("guild", "alice");
    let roles = vec!["member".to_string()];

    let (a, b) = tokio::join!(
        {
            let awarder = awarder.clone();
            let key = key.clone();
            let roles = roles.clone();
            tokio::spawn(async move { awarder.pay(&key, &roles).await.unwrap() })
        },
        {
            let awarder = awarder.clone();
            let key = key.clone();
            let roles = roles.clone();
            tokio::spawn(async move { awarder.pay(&key, &roles).await.unwrap() })
        }
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let paid = outcomes
        .iter()
        .filter(|o| matches!(o, DailyPayOutcome::Paid { .. }))
        .count();
    let lost = outcomes
        .iter()
        .filter(|o| **o == DailyPayOutcome::AlreadyPaid)
        .count();
    assert_eq!((paid, lost), (1, 1));
    assert_eq!(counter.credits.load(Ordering::SeqCst), 1);
    assert_eq!(ledger.balance(&key).await.unwrap(), 75);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_point_drop_many_claimers_one_winner() {
    let (ledger, counter) = counted_ledger();
    let drops = PointDrops::new(
        ledger.clone(),
        Arc::new(ManualClock::new(5_000)),
        DropConfig::default(),
    );
    let drop = drops.open("general").unwrap();

    let mut handles = Vec::new();
    for i in 0..12 {
        let drops = drops.clone();
        handles.push(tokio::spawn(async move {
            let key = AccountKey::scoped("guild", format!("user-{}", i));
            drops.claim("general", &key, "claim").await.unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            DropClaim::Won { drop_id, .. } => {
                assert_eq!(drop_id, drop.drop_id);
                winners += 1;
            }
            DropClaim::Missed => {}
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(counter.credits.load(Ordering::SeqCst), 1);
    assert!(!drops.expire("general", drop.drop_id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_trivia_answer_races_expiry() {
    let (ledger, counter) = counted_ledger();
    let source = StaticQuestions::new(vec![Question {
        prompt: "Capital of France?".into(),
        answer: "Paris".into(),
    }])
    .unwrap();
    let trivia = Trivia::new(
        ledger,
        Arc::new(ManualClock::new(1_000)),
        TriviaConfig {
            message_threshold: 1,
            ..TriviaConfig::default()
        },
        Arc::new(source),
    );
    let key = AccountKey::global("alice");
    let prompt = trivia.on_message(&key).await.unwrap().unwrap();

    let answering = {
        let trivia = trivia.clone();
        let key = key.clone();
        tokio::spawn(async move { trivia.answer(&key, "paris").await.unwrap() })
    };
    let expired = trivia.expire(&key, prompt.question_id);
    let answer = answering.await.unwrap();

    match answer {
        TriviaAnswer::Correct { .. } => {
            assert!(!expired);
            assert_eq!(counter.credits.load(Ordering::SeqCst), 1);
        }
        TriviaAnswer::NoActiveQuestion => {
            assert!(expired);
            assert_eq!(counter.credits.load(Ordering::SeqCst), 0);
        }
        other => panic!("unexpected answer: {:?}", other),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: however many concurrent claims race one drop, at most one is paid
    #[test]
    fn prop_drop_single_winner(claimers in 1usize..20, phrase_ok in prop::collection::vec(any::<bool>(), 20)) {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let (ledger, counter) = counted_ledger();
            let drops = PointDrops::new(ledger, Arc::new(ManualClock::new(0)), DropConfig::default());
            drops.open("general").unwrap();

            let mut handles = Vec::new();
            for i in 0..claimers {
                let drops = drops.clone();
                let message = if phrase_ok[i] { "claim" } else { "hi" };
                handles.push(tokio::spawn(async move {
                    let key = AccountKey::global(format!("user-{}", i));
                    drops.claim("general", &key, message).await.unwrap()
                }));
            }

            let mut winners = 0;
            for handle in handles {
                if matches!(handle.await.unwrap(), DropClaim::Won { .. }) {
                    winners += 1;
                }
            }

            let any_valid = phrase_ok[..claimers].iter().any(|ok| *ok);
            prop_assert_eq!(winners, usize::from(any_valid));
            prop_assert_eq!(counter.credits.load(Ordering::SeqCst), winners);
            Ok(())
        })?;
    }
}
