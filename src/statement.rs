//! Account statement data.
//!
//! Totals only count records that are still in effect: reversed originals
//! are excluded, and so are the compensating entries that undid them.

use crate::account::Account;
use crate::decimal::Money;
use crate::error::{LedgerError, Result};
use crate::transaction::{EntryStatus, TransactionRecord, TxType};
use serde::Serialize;

/// Per-type totals over active records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub deposits: Money,
    pub withdrawals: Money,
    pub transfers_in: Money,
    pub transfers_out: Money,
}

impl Totals {
    /// `deposits + transfers_in - transfers_out - withdrawals`
    pub fn net_change(&self) -> Result<Money> {
        self.deposits
            .checked_add(self.transfers_in)
            .and_then(|net| net.checked_sub(self.transfers_out))
            .and_then(|net| net.checked_sub(self.withdrawals))
            .ok_or_else(|| total_out_of_range(self.deposits))
    }

    fn add(&mut self, record: &TransactionRecord) -> Result<()> {
        let bucket = match record.kind {
            TxType::Deposit => &mut self.deposits,
            TxType::Withdrawal => &mut self.withdrawals,
            TxType::TransferIn => &mut self.transfers_in,
            TxType::TransferOut => &mut self.transfers_out,
        };
        *bucket = bucket
            .checked_add(record.amount)
            .ok_or_else(|| total_out_of_range(record.amount))?;
        Ok(())
    }
}

fn total_out_of_range(amount: Money) -> LedgerError {
    LedgerError::InvalidAmount {
        input: amount.to_string(),
        reason: "statement total out of range",
    }
}

/// Snapshot of an account with its history, newest entry first.
#[derive(Debug, Clone)]
pub struct Statement {
    pub account: Account,
    pub entries: Vec<TransactionRecord>,
    pub totals: Totals,
}

impl Statement {
    /// Builds a statement from an account and its insertion-ordered history.
    ///
    /// Fails `InvalidAmount` if a per-type total cannot be held at 2 places.
    pub fn build(account: Account, mut history: Vec<TransactionRecord>) -> Result<Self> {
        let mut totals = Totals::default();
        for record in history.iter().filter(|r| r.status() == EntryStatus::Ok) {
            totals.add(record)?;
        }
        history.reverse();

        Ok(Statement {
            account,
            entries: history,
            totals,
        })
    }

    pub fn net_change(&self) -> Result<Money> {
        self.totals.net_change()
    }
}
