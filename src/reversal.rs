//! Compensating reversals.
//!
//! A reversal never deletes or edits history. It appends mirror entries,
//! then flips `is_reversed` and sets `reversed_by_id` on the originals in the
//! same log write. Balance effects obey the same non-negative rule as any
//! other movement, so a reversal can fail `InsufficientFunds`.

use crate::account::AccountId;
use crate::decimal::Money;
use crate::engine::LedgerEngine;
use crate::error::{LedgerError, Result};
use crate::journal::Compensation;
use crate::transaction::{GroupId, NewRecord, TransactionRecord, TxId, TxType};
use log::info;

/// Outcome of a successful reversal.
#[derive(Debug, Clone, PartialEq)]
pub enum Reversal {
    /// A deposit or withdrawal was undone.
    Single {
        original: TxId,
        compensation: TxId,
        account: AccountId,
        balance: Money,
    },

    /// Both legs of a transfer were undone.
    Transfer {
        group: GroupId,
        sender: AccountId,
        receiver: AccountId,
        amount: Money,
        /// Compensation credited back to the sender.
        out_reversal: TxId,
        /// Compensation debited from the receiver.
        in_reversal: TxId,
    },
}

/// Resolves and applies the compensating action for a transaction.
pub struct ReversalResolver<'a> {
    engine: &'a LedgerEngine,
}

impl<'a> ReversalResolver<'a> {
    pub fn new(engine: &'a LedgerEngine) -> Self {
        ReversalResolver { engine }
    }

    /// Reverses transaction `id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the transaction (or an affected account) is missing
    /// - `AlreadyReversed` if it has already been reversed
    /// - `Unsupported` if it is itself a compensating entry
    /// - `InvalidState` if its transfer group is malformed
    /// - `InsufficientFunds` if undoing it would overdraw an account
    pub fn reverse(&self, id: TxId) -> Result<Reversal> {
        let record = self.engine.log().find(id)?;
        if record.is_reversed {
            return Err(LedgerError::AlreadyReversed(id));
        }
        if let Some(original) = record.reversal_of_id {
            return Err(LedgerError::Unsupported(format!(
                "transaction {} is a reversal of {} and cannot be reversed",
                id, original
            )));
        }

        let outcome = if record.kind.is_transfer() {
            self.reverse_transfer(&record)?
        } else {
            self.reverse_single(&record)?
        };

        info!("Reversed transaction {}: {:?}", id, outcome);
        Ok(outcome)
    }

    fn reverse_single(&self, record: &TransactionRecord) -> Result<Reversal> {
        let kind = record.kind.mirror();
        let amount = record.amount;
        let log = self.engine.log();

        self.engine
            .store()
            .with_account(&record.account_id, |account| {
                self.ensure_active(record.transaction_id)?;
                let balance = account.preview_delta(kind.signed(amount))?;

                let ids = log.append_compensations(vec![Compensation {
                    original: record.transaction_id,
                    entry: NewRecord::new(account.id.clone(), kind, amount),
                }])?;
                account.commit(balance);

                Ok(Reversal::Single {
                    original: record.transaction_id,
                    compensation: ids[0],
                    account: account.id.clone(),
                    balance,
                })
            })
    }

    fn reverse_transfer(&self, record: &TransactionRecord) -> Result<Reversal> {
        let group = record.transfer_group_id.ok_or_else(|| {
            LedgerError::InvalidState(format!(
                "transfer leg {} has no transfer group",
                record.transaction_id
            ))
        })?;
        let (out_leg, in_leg) = self.transfer_legs(group)?;
        let amount = out_leg.amount;
        let log = self.engine.log();

        self.engine.store().with_pair(
            &out_leg.account_id,
            &in_leg.account_id,
            |sender, receiver| {
                self.ensure_active(out_leg.transaction_id)?;
                self.ensure_active(in_leg.transaction_id)?;

                let sender_balance = sender.preview_delta(amount)?;
                let receiver_balance = receiver.preview_delta(-amount)?;

                let compensation_group = log.next_group_id();
                let ids = log.append_compensations(vec![
                    Compensation {
                        original: out_leg.transaction_id,
                        entry: NewRecord::new(sender.id.clone(), TxType::TransferIn, amount)
                            .in_group(compensation_group),
                    },
                    Compensation {
                        original: in_leg.transaction_id,
                        entry: NewRecord::new(receiver.id.clone(), TxType::TransferOut, amount)
                            .in_group(compensation_group),
                    },
                ])?;

                sender.commit(sender_balance);
                receiver.commit(receiver_balance);

                Ok(Reversal::Transfer {
                    group,
                    sender: sender.id.clone(),
                    receiver: receiver.id.clone(),
                    amount,
                    out_reversal: ids[0],
                    in_reversal: ids[1],
                })
            },
        )
    }

    /// Fetches and validates both legs of a transfer group.
    ///
    /// The group must hold exactly one `transfer_out` and one `transfer_in`
    /// with the same amount, and neither may be reversed on its own.
    fn transfer_legs(&self, group: GroupId) -> Result<(TransactionRecord, TransactionRecord)> {
        let legs = self.engine.log().find_by_group(group);
        if legs.len() != 2 {
            return Err(LedgerError::InvalidState(format!(
                "transfer group {} has {} legs, expected 2",
                group,
                legs.len()
            )));
        }

        let mut out_leg = None;
        let mut in_leg = None;
        for leg in legs {
            match leg.kind {
                TxType::TransferOut => out_leg = Some(leg),
                TxType::TransferIn => in_leg = Some(leg),
                other => {
                    return Err(LedgerError::InvalidState(format!(
                        "transfer group {} contains a {} record",
                        group, other
                    )))
                }
            }
        }

        let (Some(out_leg), Some(in_leg)) = (out_leg, in_leg) else {
            return Err(LedgerError::InvalidState(format!(
                "transfer group {} lacks a sender or receiver leg",
                group
            )));
        };

        if out_leg.amount != in_leg.amount {
            return Err(LedgerError::InvalidState(format!(
                "transfer group {} legs diverge: {} out, {} in",
                group, out_leg.amount, in_leg.amount
            )));
        }
        if out_leg.is_reversed != in_leg.is_reversed {
            return Err(LedgerError::InvalidState(format!(
                "transfer group {} is half reversed",
                group
            )));
        }

        Ok((out_leg, in_leg))
    }

    /// Re-checks the reversal flag once the accounts are locked, so racing
    /// reversals of one record report `AlreadyReversed` to the loser.
    fn ensure_active(&self, id: TxId) -> Result<()> {
        if self.engine.log().find(id)?.is_reversed {
            return Err(LedgerError::AlreadyReversed(id));
        }
        Ok(())
    }
}
