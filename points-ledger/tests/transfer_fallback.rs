//! Transfer fallback and reconciliation paths under injected store faults

use async_trait::async_trait;
use points_ledger::store::StoreResult;
use points_ledger::{
    Account, AccountKey, AccountUpdate, BalanceLedger, ChannelNotifier, EntryReason, Error,
    GlobalUpdate, GlobalWithdrawState, LedgerEntry, MemoryStore, ProfileStore, ServerId,
    StoreError, TransferEngine, TransferPath,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Delegates to a [`MemoryStore`] but can fail transactions and credits
struct FaultyStore {
    inner: MemoryStore,
    fail_transactions: AtomicBool,
    fail_credits: AtomicBool,
}

impl FaultyStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_transactions: AtomicBool::new(false),
            fail_credits: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ProfileStore for FaultyStore {
    async fn find_one(&self, key: &AccountKey) -> StoreResult<Option<Account>> {
        self.inner.find_one(key).await
    }

    async fn create(&self, key: &AccountKey) -> StoreResult<Account> {
        self.inner.create(key).await
    }

    async fn find_one_and_update(
        &self,
        key: &AccountKey,
        update: AccountUpdate,
        upsert: bool,
    ) -> StoreResult<Option<Account>> {
        if update.is_credit() && self.fail_credits.load(Ordering::SeqCst) {
            return Err(StoreError::Storage("connection reset".to_string()));
        }
        self.inner.find_one_and_update(key, update, upsert).await
    }

    async fn transact(
        &self,
        ops: Vec<(AccountKey, AccountUpdate)>,
    ) -> StoreResult<Option<Vec<Account>>> {
        if self.fail_transactions.load(Ordering::SeqCst) {
            return Err(StoreError::Storage("transaction aborted".to_string()));
        }
        self.inner.transact(ops).await
    }

    async fn find_global(&self, scope: &Option<ServerId>) -> StoreResult<GlobalWithdrawState> {
        self.inner.find_global(scope).await
    }

    async fn update_global(
        &self,
        scope: &Option<ServerId>,
        update: GlobalUpdate,
    ) -> StoreResult<Option<GlobalWithdrawState>> {
        self.inner.update_global(scope, update).await
    }

    async fn journal(&self, key: &AccountKey) -> StoreResult<Vec<LedgerEntry>> {
        self.inner.journal(key).await
    }
}

async fn setup(store: Arc<FaultyStore>) -> (BalanceLedger, TransferEngine, AccountKey, AccountKey) {
    let ledger = BalanceLedger::new(store);
    let a = AccountKey::global("a");
    let b = AccountKey::global("b");
    ledger.apply_delta(&a, 100, EntryReason::Adjustment).await.unwrap();
    (ledger.clone(), TransferEngine::new(ledger), a, b)
}

#[tokio::test]
async fn test_transient_transaction_failure_uses_two_step() {
    let store = Arc::new(FaultyStore::new());
    let (ledger, engine, a, b) = setup(store.clone()).await;
    store.fail_transactions.store(true, Ordering::SeqCst);

    let receipt = engine.transfer(&a, &b, 30).await.unwrap();
    assert_eq!(receipt.path, TransferPath::TwoStep);
    assert_eq!(ledger.balance(&a).await.unwrap(), 70);
    assert_eq!(ledger.balance(&b).await.unwrap(), 30);
    assert_eq!(
        ledger.metrics().transfers_total.with_label_values(&["two_step"]).get(),
        1
    );
}

#[tokio::test]
async fn test_failed_credit_is_reconciliation_risk() {
    let store = Arc::new(FaultyStore::new());
    let (ledger, engine, a, b) = setup(store.clone()).await;
    store.fail_transactions.store(true, Ordering::SeqCst);
    store.fail_credits.store(true, Ordering::SeqCst);

    let err = engine.transfer(&a, &b, 30).await.unwrap_err();
    assert!(matches!(err, Error::Unavailable(_)));

    // Accepted risk of the fallback path: the debit stands and is counted
    assert_eq!(ledger.balance(&a).await.unwrap(), 70);
    assert!(store.find_one(&b).await.unwrap().is_none());
    assert_eq!(ledger.metrics().reconciliation_risks.get(), 1);
}

#[tokio::test]
async fn test_insufficient_funds_on_fallback_touches_nothing() {
    let store = Arc::new(FaultyStore::new());
    let (ledger, engine, a, b) = setup(store.clone()).await;
    store.fail_transactions.store(true, Ordering::SeqCst);

    let err = engine.transfer(&a, &b, 101).await.unwrap_err();
    assert!(matches!(err, Error::InsufficientFunds { .. }));
    assert_eq!(ledger.balance(&a).await.unwrap(), 100);
    assert_eq!(ledger.metrics().reconciliation_risks.get(), 0);
}

#[tokio::test]
async fn test_transfer_notifies_both_accounts() {
    let (notifier, mut rx) = ChannelNotifier::new();
    let ledger = BalanceLedger::new(Arc::new(MemoryStore::new()))
        .with_observer(Arc::new(notifier));
    let engine = TransferEngine::new(ledger.clone());
    let a = AccountKey::global("a");
    let b = AccountKey::global("b");
    ledger.apply_delta(&a, 10, EntryReason::Adjustment).await.unwrap();
    let _ = rx.recv().await;

    engine.transfer(&a, &b, 4).await.unwrap();

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!((first.account.key, first.delta), (a, -4));
    assert_eq!((second.account.key, second.delta), (b, 4));
}
