//! Transfer engine
//!
//! Moves points between two accounts. The preferred path is one
//! multi-account store transaction. When the store cannot provide that, the
//! engine falls back to a conditional debit of the sender followed by a
//! credit of the receiver. A failure between those two steps leaves the
//! sender debited and the receiver uncredited; that case is logged on the
//! `reconciliation` target and counted, and the caller sees `Unavailable`.
//! Nothing here retries.

use crate::{
    error::StoreError,
    ledger::BalanceLedger,
    types::{AccountKey, EntryReason, TransferPath, TransferReceipt},
    update::AccountUpdate,
    Error, Result,
};
use uuid::Uuid;

/// Two-account point transfers built on the ledger
#[derive(Debug, Clone)]
pub struct TransferEngine {
    ledger: BalanceLedger,
}

impl TransferEngine {
    /// Engine sharing the ledger's store, observer and metrics
    pub fn new(ledger: BalanceLedger) -> Self {
        Self { ledger }
    }

    /// Move `amount` points from `sender` to `receiver`
    pub async fn transfer(
        &self,
        sender: &AccountKey,
        receiver: &AccountKey,
        amount: i64,
    ) -> Result<TransferReceipt> {
        if amount <= 0 {
            return Err(Error::InvalidAmount(format!(
                "Transfer amount must be positive, got {}",
                amount
            )));
        }
        if sender == receiver {
            return Err(Error::SelfTransfer);
        }

        let transfer_id = Uuid::now_v7();
        let debit = AccountUpdate::AdjustBalance {
            delta: -amount,
            reason: EntryReason::TransferOut {
                counterparty: receiver.clone(),
                transfer_id,
            },
        };
        let credit = AccountUpdate::AdjustBalance {
            delta: amount,
            reason: EntryReason::TransferIn {
                counterparty: sender.clone(),
                transfer_id,
            },
        };

        let store = self.ledger.store();
        let receipt = match store
            .transact(vec![
                (sender.clone(), debit.clone()),
                (receiver.clone(), credit.clone()),
            ])
            .await
        {
            Ok(Some(mut accounts)) if accounts.len() == 2 => {
                let receiver_account = accounts.remove(1);
                let sender_account = accounts.remove(0);
                TransferReceipt {
                    transfer_id,
                    sender: sender_account,
                    receiver: receiver_account,
                    amount,
                    path: TransferPath::Atomic,
                }
            }
            Ok(Some(accounts)) => {
                return Err(Error::Unavailable(format!(
                    "Store returned {} accounts for a two-leg transfer",
                    accounts.len()
                )));
            }
            Ok(None) => return Err(self.refused(sender, receiver, amount).await),
            Err(e) => {
                if !matches!(e, StoreError::TransactionsUnsupported) {
                    tracing::warn!(
                        %transfer_id,
                        error = %e,
                        "Atomic transfer failed, falling back to two-step"
                    );
                }
                self.two_step(transfer_id, sender, receiver, amount, debit, credit)
                    .await?
            }
        };

        self.ledger
            .metrics()
            .record_transfer(match receipt.path {
                TransferPath::Atomic => "atomic",
                TransferPath::TwoStep => "two_step",
            });
        self.ledger.notify(&receipt.sender, -amount);
        self.ledger.notify(&receipt.receiver, amount);

        tracing::info!(
            %transfer_id,
            sender = %sender,
            receiver = %receiver,
            amount,
            path = ?receipt.path,
            "Transfer committed"
        );

        Ok(receipt)
    }

    async fn two_step(
        &self,
        transfer_id: Uuid,
        sender: &AccountKey,
        receiver: &AccountKey,
        amount: i64,
        debit: AccountUpdate,
        credit: AccountUpdate,
    ) -> Result<TransferReceipt> {
        let store = self.ledger.store();

        let sender_account = match store.find_one_and_update(sender, debit, false).await? {
            Some(account) => account,
            None => return Err(self.insufficient(sender, amount)),
        };

        match store.find_one_and_update(receiver, credit, true).await {
            Ok(Some(receiver_account)) => Ok(TransferReceipt {
                transfer_id,
                sender: sender_account,
                receiver: receiver_account,
                amount,
                path: TransferPath::TwoStep,
            }),
            outcome => {
                let cause = match outcome {
                    Err(e) => e.to_string(),
                    _ => "credit refused".to_string(),
                };
                self.ledger.metrics().record_reconciliation_risk();
                tracing::error!(
                    target: "reconciliation",
                    %transfer_id,
                    sender = %sender,
                    receiver = %receiver,
                    amount,
                    sender_balance = sender_account.balance,
                    cause = %cause,
                    "Sender debited but receiver not credited"
                );
                // The debit stands; tell observers the sender's balance moved.
                self.ledger.notify(&sender_account, -amount);
                Err(Error::Unavailable(format!(
                    "Transfer {} interrupted after debit: {}",
                    transfer_id, cause
                )))
            }
        }
    }

    /// Name the leg that refused an atomic transfer. A sender that covers
    /// the amount means the receiver's credit would have overflowed.
    async fn refused(&self, sender: &AccountKey, receiver: &AccountKey, amount: i64) -> Error {
        match self.ledger.store().find_one(sender).await {
            Ok(Some(account)) if account.balance >= amount => {
                tracing::warn!(
                    receiver = %receiver,
                    amount,
                    "Transfer refused, receiver balance would overflow"
                );
                Error::InvalidAmount(format!(
                    "Transfer of {} would overflow the balance of {}",
                    amount, receiver
                ))
            }
            _ => self.insufficient(sender, amount),
        }
    }

    fn insufficient(&self, sender: &AccountKey, amount: i64) -> Error {
        self.ledger.metrics().record_insufficient_funds();
        Error::InsufficientFunds {
            account: sender.to_string(),
            required: amount.unsigned_abs(),
        }
    }
}
