//! Error types for the ledger.

use crate::account::AccountId;
use crate::decimal::Money;
use crate::transaction::TxId;
use std::fmt;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// The entity a lookup failed to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Account(AccountId),
    Transaction(TxId),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Account(id) => write!(f, "account {}", id),
            Missing::Transaction(id) => write!(f, "transaction {}", id),
        }
    }
}

/// Errors that can occur during ledger operation.
///
/// Every variant except the I/O and CSV ones is raised before any state is
/// touched: a failed operation leaves balances and the log unchanged.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Unknown (or closed) account, or unknown transaction id
    #[error("{0} not found")]
    NotFound(Missing),

    /// Non-positive amount, or one not exact at 2 fraction digits
    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: &'static str },

    /// The debit would leave the account below zero
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Money,
        requested: Money,
    },

    /// The transaction already has a compensating entry
    #[error("Transaction {0} already reversed")]
    AlreadyReversed(TxId),

    /// Malformed transfer group or diverging transfer legs
    #[error("Invalid ledger state: {0}")]
    InvalidState(String),

    /// Operation is not permitted by policy
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// An account with this id already exists
    #[error("Account {0} already exists")]
    AccountExists(AccountId),

    /// Sender and receiver of a transfer are the same account
    #[error("Cannot transfer from account {0} to itself")]
    SelfTransfer(AccountId),

    /// A batch command row could not be interpreted
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: banking-ledger <commands.csv> [--journal]")]
    MissingArgument,
}

impl LedgerError {
    pub(crate) fn account_not_found(id: &AccountId) -> Self {
        LedgerError::NotFound(Missing::Account(id.clone()))
    }

    pub(crate) fn transaction_not_found(id: TxId) -> Self {
        LedgerError::NotFound(Missing::Transaction(id))
    }
}
