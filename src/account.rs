//! Account model and the concurrent account store.
//!
//! Maintains the invariant: `balance >= 0` at all times.

use crate::decimal::Money;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Stable, opaque account identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        AccountId(id.to_string())
    }
}

/// Role of an identity record. Only clients hold ledger accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Manager,
}

/// Display metadata for an account holder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Holder {
    pub name: String,
    pub surname: String,
    pub email: Option<String>,
}

/// Identity record shared by clients and managers.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: AccountId,
    pub role: Role,
    pub holder: Holder,
}

impl Identity {
    pub fn client(id: impl Into<String>, holder: Holder) -> Self {
        Identity {
            id: AccountId::new(id),
            role: Role::Client,
            holder,
        }
    }

    pub fn manager(id: impl Into<String>, holder: Holder) -> Self {
        Identity {
            id: AccountId::new(id),
            role: Role::Manager,
            holder,
        }
    }
}

/// A client's account state.
///
/// # Invariants
///
/// - `balance >= 0` after every operation
/// - Once closed, the account rejects all further operations with `NotFound`
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: AccountId,

    pub balance: Money,

    /// Optional display metadata.
    pub holder: Option<Holder>,

    pub created_at: DateTime<Utc>,

    #[serde(skip)]
    closed: bool,
}

impl Account {
    /// Creates a new account with a zero balance.
    pub fn new(id: AccountId, holder: Option<Holder>) -> Self {
        Account {
            id,
            balance: Money::ZERO,
            holder,
            created_at: Utc::now(),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Computes the balance that applying `delta` would produce, without
    /// changing anything.
    ///
    /// Fails `InsufficientFunds` if the result would be negative.
    pub fn preview_delta(&self, delta: Money) -> Result<Money> {
        let next = self
            .balance
            .checked_add(delta)
            .ok_or(LedgerError::InvalidAmount {
                input: delta.to_string(),
                reason: "balance overflow",
            })?;
        if next.is_negative() {
            return Err(LedgerError::InsufficientFunds {
                account: self.id.clone(),
                balance: self.balance,
                requested: delta.abs(),
            });
        }
        Ok(next)
    }

    /// Adjusts the balance by `delta` (positive = credit, negative = debit).
    pub(crate) fn apply_delta(&mut self, delta: Money) -> Result<Money> {
        let next = self.preview_delta(delta)?;
        self.balance = next;
        Ok(next)
    }

    /// Stores a balance already validated by [`Account::preview_delta`].
    pub(crate) fn commit(&mut self, balance: Money) {
        debug_assert!(!balance.is_negative());
        self.balance = balance;
    }
}

type AccountCell = Arc<Mutex<Account>>;

/// Thread-safe account storage with per-account mutual exclusion.
///
/// The map lock only guards membership. Each account sits behind its own
/// mutex, so operations on different accounts never contend. Callers that
/// need two accounts go through [`AccountStore::with_pair`], which locks in
/// ascending id order.
#[derive(Default)]
pub struct AccountStore {
    accounts: RwLock<HashMap<AccountId, AccountCell>>,
}

impl AccountStore {
    pub fn new() -> Self {
        AccountStore::default()
    }

    /// Adds a new account. Fails `AccountExists` on a duplicate id.
    pub fn insert(&self, account: Account) -> Result<()> {
        let mut accounts = self.accounts.write();
        if accounts.contains_key(&account.id) {
            return Err(LedgerError::AccountExists(account.id));
        }
        accounts.insert(account.id.clone(), Arc::new(Mutex::new(account)));
        Ok(())
    }

    /// Returns a snapshot of the account.
    pub fn get(&self, id: &AccountId) -> Result<Account> {
        self.with_account(id, |account| Ok(account.clone()))
    }

    pub fn contains(&self, id: &AccountId) -> bool {
        self.accounts.read().contains_key(id)
    }

    /// Snapshots of all accounts, sorted by id.
    pub fn list(&self) -> Vec<Account> {
        let cells: Vec<AccountCell> = self.accounts.read().values().cloned().collect();
        let mut accounts: Vec<Account> = cells
            .iter()
            .map(|cell| cell.lock().clone())
            .filter(|account| !account.is_closed())
            .collect();
        accounts.sort_by(|a, b| a.id.cmp(&b.id));
        accounts
    }

    /// Adjusts a balance by `delta` under the account's lock.
    pub fn apply_delta(&self, id: &AccountId, delta: Money) -> Result<Money> {
        self.with_account(id, |account| account.apply_delta(delta))
    }

    /// Runs `f` with exclusive access to one account.
    pub fn with_account<T>(
        &self,
        id: &AccountId,
        f: impl FnOnce(&mut Account) -> Result<T>,
    ) -> Result<T> {
        let cell = self.cell(id)?;
        let mut account = cell.lock();
        if account.is_closed() {
            return Err(LedgerError::account_not_found(id));
        }
        f(&mut account)
    }

    /// Runs `f` with exclusive access to two distinct accounts.
    ///
    /// Locks are taken in ascending id order regardless of argument order;
    /// `f` receives the accounts in argument order.
    pub fn with_pair<T>(
        &self,
        first: &AccountId,
        second: &AccountId,
        f: impl FnOnce(&mut Account, &mut Account) -> Result<T>,
    ) -> Result<T> {
        if first == second {
            return Err(LedgerError::SelfTransfer(first.clone()));
        }
        let first_cell = self.cell(first)?;
        let second_cell = self.cell(second)?;

        let (mut a, mut b) = if first < second {
            let a = first_cell.lock();
            let b = second_cell.lock();
            (a, b)
        } else {
            let b = second_cell.lock();
            let a = first_cell.lock();
            (a, b)
        };

        if a.is_closed() {
            return Err(LedgerError::account_not_found(first));
        }
        if b.is_closed() {
            return Err(LedgerError::account_not_found(second));
        }
        f(&mut a, &mut b)
    }

    /// Removes an account and marks it closed.
    ///
    /// `on_close` runs while the account's lock is still held, so no
    /// operation on it can interleave with the cleanup.
    pub fn remove<T>(&self, id: &AccountId, on_close: impl FnOnce(&Account) -> T) -> Result<T> {
        let cell = self
            .accounts
            .write()
            .remove(id)
            .ok_or_else(|| LedgerError::account_not_found(id))?;
        let mut account = cell.lock();
        account.closed = true;
        Ok(on_close(&account))
    }

    fn cell(&self, id: &AccountId) -> Result<AccountCell> {
        self.accounts
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::account_not_found(id))
    }
}
