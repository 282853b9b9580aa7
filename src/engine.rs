//! Core ledger engine.
//!
//! Applies deposits, withdrawals and transfers against the account store and
//! records each movement in the transaction log. Every operation validates
//! first and mutates last: the balance preview, the log append and the
//! balance commit all happen while the affected accounts are locked.

use crate::account::{Account, AccountId, AccountStore, Holder, Identity, Role};
use crate::decimal::Money;
use crate::error::{LedgerError, Result};
use crate::journal::TransactionLog;
use crate::reversal::{Reversal, ReversalResolver};
use crate::statement::Statement;
use crate::transaction::{GroupId, NewRecord, TransactionRecord, TxId, TxType};
use log::debug;

/// Outcome of a single-account movement.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub account_id: AccountId,

    /// Balance after the movement.
    pub balance: Money,

    pub transaction_id: TxId,
}

/// Outcome of a transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub group: GroupId,
    pub sender: AccountId,
    pub receiver: AccountId,
    pub amount: Money,
    pub sender_balance: Money,
    pub receiver_balance: Money,
    pub out_id: TxId,
    pub in_id: TxId,
}

/// The ledger engine.
///
/// Safe to share between threads; all methods take `&self`. Operations on
/// one account are serialized by that account's lock, and transfers lock
/// both participants in ascending id order.
#[derive(Default)]
pub struct LedgerEngine {
    accounts: AccountStore,
    log: TransactionLog,
}

impl LedgerEngine {
    /// Creates a new empty engine.
    pub fn new() -> Self {
        LedgerEngine {
            accounts: AccountStore::new(),
            log: TransactionLog::new(),
        }
    }

    pub(crate) fn store(&self) -> &AccountStore {
        &self.accounts
    }

    pub(crate) fn log(&self) -> &TransactionLog {
        &self.log
    }

    /// Opens an account, recording a deposit for a positive initial balance.
    ///
    /// Fails `AccountExists` on a duplicate id and `InvalidAmount` for a
    /// negative initial balance.
    pub fn create_account(
        &self,
        id: AccountId,
        holder: Option<Holder>,
        initial_balance: Money,
    ) -> Result<Account> {
        if initial_balance.is_negative() {
            return Err(LedgerError::InvalidAmount {
                input: initial_balance.to_string(),
                reason: "initial balance cannot be negative",
            });
        }

        self.accounts.insert(Account::new(id.clone(), holder))?;
        debug!("Opened account {}", id);

        if initial_balance.is_positive() {
            self.deposit(&id, initial_balance)?;
        }
        self.accounts.get(&id)
    }

    /// Opens an account for a client identity. Managers hold no accounts.
    pub fn open_account(&self, identity: &Identity, initial_balance: Money) -> Result<Account> {
        if identity.role != Role::Client {
            return Err(LedgerError::Unsupported(format!(
                "identity {} is not a client",
                identity.id
            )));
        }
        self.create_account(
            identity.id.clone(),
            Some(identity.holder.clone()),
            initial_balance,
        )
    }

    /// Removes an account together with its transaction history.
    ///
    /// Returns the number of log records purged.
    pub fn delete_account(&self, id: &AccountId) -> Result<usize> {
        let purged = self
            .accounts
            .remove(id, |_| self.log.purge_account(id))?;
        debug!("Closed account {}, purged {} records", id, purged);
        Ok(purged)
    }

    /// Credits an account.
    pub fn deposit(&self, id: &AccountId, amount: Money) -> Result<Receipt> {
        let amount = amount.require_positive()?;
        self.post(id, TxType::Deposit, amount)
    }

    /// Debits an account. Fails `InsufficientFunds` if the balance would go
    /// below zero.
    pub fn withdraw(&self, id: &AccountId, amount: Money) -> Result<Receipt> {
        let amount = amount.require_positive()?;
        self.post(id, TxType::Withdrawal, amount)
    }

    /// Moves funds between two accounts as one unit.
    ///
    /// Both legs are appended under a fresh transfer group; either both
    /// balances change and both records exist, or nothing happens.
    pub fn transfer(
        &self,
        sender: &AccountId,
        receiver: &AccountId,
        amount: Money,
    ) -> Result<TransferReceipt> {
        let amount = amount.require_positive()?;

        self.accounts.with_pair(sender, receiver, |from, to| {
            let sender_balance = from.preview_delta(-amount)?;
            let receiver_balance = to.preview_delta(amount)?;

            let group = self.log.next_group_id();
            let ids = self.log.append_all(vec![
                NewRecord::new(sender.clone(), TxType::TransferOut, amount).in_group(group),
                NewRecord::new(receiver.clone(), TxType::TransferIn, amount).in_group(group),
            ]);

            from.commit(sender_balance);
            to.commit(receiver_balance);

            debug!(
                "Transferred {} from {} to {} (group {})",
                amount, sender, receiver, group
            );

            Ok(TransferReceipt {
                group,
                sender: sender.clone(),
                receiver: receiver.clone(),
                amount,
                sender_balance,
                receiver_balance,
                out_id: ids[0],
                in_id: ids[1],
            })
        })
    }

    /// Reverses a prior transaction. See [`ReversalResolver::reverse`].
    pub fn reverse(&self, id: TxId) -> Result<Reversal> {
        self.reversals().reverse(id)
    }

    pub fn reversals(&self) -> ReversalResolver<'_> {
        ReversalResolver::new(self)
    }

    /// Snapshot of one account.
    pub fn account(&self, id: &AccountId) -> Result<Account> {
        self.accounts.get(id)
    }

    /// Snapshots of all accounts, sorted by id.
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.list()
    }

    /// An account's records in insertion order.
    pub fn history(&self, id: &AccountId) -> Result<Vec<TransactionRecord>> {
        self.accounts
            .with_account(id, |_| Ok(self.log.find_by_account(id)))
    }

    /// Every record in the ledger, in id order.
    pub fn journal(&self) -> Vec<TransactionRecord> {
        self.log.all()
    }

    pub fn transaction(&self, id: TxId) -> Result<TransactionRecord> {
        self.log.find(id)
    }

    /// The records of one transfer group, in id order.
    pub fn transfer_group(&self, group: GroupId) -> Vec<TransactionRecord> {
        self.log.find_by_group(group)
    }

    /// Account snapshot and history, read under the account's lock so the
    /// balance and the records agree.
    pub fn statement(&self, id: &AccountId) -> Result<Statement> {
        self.accounts.with_account(id, |account| {
            Statement::build(account.clone(), self.log.find_by_account(id))
        })
    }

    /// Applies a single-account movement.
    fn post(&self, id: &AccountId, kind: TxType, amount: Money) -> Result<Receipt> {
        self.accounts.with_account(id, |account| {
            let balance = account.preview_delta(kind.signed(amount))?;
            let transaction_id = self.log.append(NewRecord::new(id.clone(), kind, amount));
            account.commit(balance);

            debug!("{} of {} on account {}, balance {}", kind, amount, id, balance);

            Ok(Receipt {
                account_id: id.clone(),
                balance,
                transaction_id,
            })
        })
    }
}
