//! # Banking Ledger
//!
//! A concurrent ledger that keeps non-negative account balances and an
//! append-only log of every movement, with atomic two-party transfers and
//! compensating reversals.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: Exactly 2 decimal places via `rust_decimal`;
//!   imprecise amounts are rejected, never rounded
//! - **Validate, then mutate**: A failed operation changes nothing
//! - **Per-account locking**: Transfers lock both accounts in id order
//! - **History is never rewritten**: Reversals append mirror entries and
//!   link them to the originals by id
//!
//! ## Example
//!
//! ```
//! use banking_ledger::{LedgerEngine, Money};
//! use std::str::FromStr;
//!
//! let engine = LedgerEngine::new();
//! engine.create_account("a".into(), None, Money::from_str("100").unwrap()).unwrap();
//! engine.create_account("b".into(), None, Money::ZERO).unwrap();
//!
//! let receipt = engine
//!     .transfer(&"a".into(), &"b".into(), Money::from_str("60").unwrap())
//!     .unwrap();
//! assert_eq!(receipt.sender_balance.to_string(), "40.00");
//!
//! engine.reverse(receipt.out_id).unwrap();
//! assert_eq!(engine.account(&"b".into()).unwrap().balance.to_string(), "0.00");
//! ```

pub mod account;
pub mod batch;
pub mod command;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod journal;
pub mod reversal;
pub mod statement;
pub mod transaction;

pub use account::{Account, AccountId, AccountStore, Holder, Identity, Role};
pub use batch::{BatchProcessor, BatchSummary};
pub use command::{Command, CommandRecord};
pub use decimal::Money;
pub use engine::{LedgerEngine, Receipt, TransferReceipt};
pub use error::{LedgerError, Missing, Result};
pub use journal::{Compensation, TransactionLog};
pub use reversal::{Reversal, ReversalResolver};
pub use statement::{Statement, Totals};
pub use transaction::{EntryStatus, GroupId, NewRecord, TransactionRecord, TxId, TxType};
