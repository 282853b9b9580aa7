//! Transaction record model.
//!
//! Records live in the [`TransactionLog`](crate::journal::TransactionLog)
//! arena and refer to one another by plain id, never by reference.

use crate::account::AccountId;
use crate::decimal::Money;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Log-assigned transaction id. Strictly increasing in append order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TxId(pub u64);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Links the two legs of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of balance movement a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    /// Credit from outside the ledger.
    Deposit,

    /// Debit to outside the ledger.
    Withdrawal,

    /// Sender leg of a transfer.
    TransferOut,

    /// Receiver leg of a transfer.
    TransferIn,
}

impl TxType {
    pub fn is_transfer(self) -> bool {
        matches!(self, TxType::TransferOut | TxType::TransferIn)
    }

    /// Whether this movement adds to the account balance.
    pub fn is_credit(self) -> bool {
        matches!(self, TxType::Deposit | TxType::TransferIn)
    }

    /// The movement that undoes this one on the same account.
    pub fn mirror(self) -> TxType {
        match self {
            TxType::Deposit => TxType::Withdrawal,
            TxType::Withdrawal => TxType::Deposit,
            TxType::TransferOut => TxType::TransferIn,
            TxType::TransferIn => TxType::TransferOut,
        }
    }

    /// Balance delta of moving `amount` in this direction.
    pub fn signed(self, amount: Money) -> Money {
        if self.is_credit() {
            amount
        } else {
            -amount
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TxType::Deposit => "deposit",
            TxType::Withdrawal => "withdrawal",
            TxType::TransferOut => "transfer_out",
            TxType::TransferIn => "transfer_in",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An appended log entry.
///
/// Everything except `is_reversed` and `reversed_by_id` is fixed at append
/// time; those two are set once, together, by a reversal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub transaction_id: TxId,

    pub account_id: AccountId,

    #[serde(rename = "type")]
    pub kind: TxType,

    /// Always strictly positive; direction comes from `kind`.
    pub amount: Money,

    pub timestamp: DateTime<Utc>,

    pub transfer_group_id: Option<GroupId>,

    pub is_reversed: bool,

    /// The record this one compensates.
    pub reversal_of_id: Option<TxId>,

    /// The compensating record created for this one.
    pub reversed_by_id: Option<TxId>,
}

impl TransactionRecord {
    /// Whether this record was itself created by a reversal.
    pub fn is_compensation(&self) -> bool {
        self.reversal_of_id.is_some()
    }

    /// Balance delta this record applied to its account.
    pub fn signed_amount(&self) -> Money {
        self.kind.signed(self.amount)
    }

    pub fn status(&self) -> EntryStatus {
        if self.is_reversed {
            EntryStatus::Reversed
        } else if self.is_compensation() {
            EntryStatus::Reversal
        } else {
            EntryStatus::Ok
        }
    }
}

/// Presentation status of a record within an account history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    Ok,
    Reversed,
    Reversal,
}

/// A record not yet appended. The log assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub account_id: AccountId,
    pub kind: TxType,
    pub amount: Money,
    pub transfer_group_id: Option<GroupId>,
    pub reversal_of_id: Option<TxId>,
}

impl NewRecord {
    pub fn new(account_id: AccountId, kind: TxType, amount: Money) -> Self {
        NewRecord {
            account_id,
            kind,
            amount,
            transfer_group_id: None,
            reversal_of_id: None,
        }
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.transfer_group_id = Some(group);
        self
    }

    pub fn reversing(mut self, original: TxId) -> Self {
        self.reversal_of_id = Some(original);
        self
    }

    pub(crate) fn into_record(self, transaction_id: TxId) -> TransactionRecord {
        TransactionRecord {
            transaction_id,
            account_id: self.account_id,
            kind: self.kind,
            amount: self.amount,
            timestamp: Utc::now(),
            transfer_group_id: self.transfer_group_id,
            is_reversed: false,
            reversal_of_id: self.reversal_of_id,
            reversed_by_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_pairs() {
        assert_eq!(TxType::Deposit.mirror(), TxType::Withdrawal);
        assert_eq!(TxType::Withdrawal.mirror(), TxType::Deposit);
        assert_eq!(TxType::TransferOut.mirror(), TxType::TransferIn);
        assert_eq!(TxType::TransferIn.mirror(), TxType::TransferOut);
    }

    #[test]
    fn test_signed_amount_direction() {
        let amount = Money::from_cents(250);
        assert_eq!(TxType::Deposit.signed(amount), amount);
        assert_eq!(TxType::TransferIn.signed(amount), amount);
        assert_eq!(TxType::Withdrawal.signed(amount), -amount);
        assert_eq!(TxType::TransferOut.signed(amount), -amount);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(TxType::TransferOut.to_string(), "transfer_out");
        assert_eq!(TxType::Withdrawal.as_str(), "withdrawal");
    }

    #[test]
    fn test_new_record_builders() {
        let draft = NewRecord::new("a".into(), TxType::TransferIn, Money::from_cents(100))
            .in_group(GroupId(7))
            .reversing(TxId(3));

        let record = draft.into_record(TxId(9));
        assert_eq!(record.transaction_id, TxId(9));
        assert_eq!(record.transfer_group_id, Some(GroupId(7)));
        assert_eq!(record.reversal_of_id, Some(TxId(3)));
        assert!(!record.is_reversed);
        assert_eq!(record.reversed_by_id, None);
    }

    #[test]
    fn test_status() {
        let mut record =
            NewRecord::new("a".into(), TxType::Deposit, Money::from_cents(100)).into_record(TxId(1));
        assert_eq!(record.status(), EntryStatus::Ok);

        record.reversal_of_id = Some(TxId(0));
        assert_eq!(record.status(), EntryStatus::Reversal);

        record.is_reversed = true;
        assert_eq!(record.status(), EntryStatus::Reversed);
    }
}
