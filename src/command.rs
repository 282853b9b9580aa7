//! Batch command rows as read from CSV.

use crate::account::AccountId;
use crate::decimal::Money;
use crate::error::{LedgerError, Result};
use crate::transaction::TxId;
use serde::Deserialize;
use std::str::FromStr;

/// Raw command row as read from CSV.
///
/// Columns: `type,account,counterparty,amount,tx`. Which columns are
/// required depends on the command type; unused ones may be left empty.
#[derive(Debug, Deserialize)]
pub struct CommandRecord {
    /// open, deposit, withdrawal, transfer, reverse, close
    #[serde(rename = "type")]
    pub op: String,

    pub account: Option<String>,

    /// Receiving account of a transfer
    pub counterparty: Option<String>,

    pub amount: Option<String>,

    /// Transaction to reverse
    pub tx: Option<u64>,
}

/// A parsed command ready for the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create an account with an initial balance (zero if omitted).
    Open { account: AccountId, initial: Money },

    Deposit { account: AccountId, amount: Money },

    Withdrawal { account: AccountId, amount: Money },

    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Money,
    },

    Reverse { tx: TxId },

    /// Delete the account and its history.
    Close { account: AccountId },
}

impl CommandRecord {
    /// Parses the raw CSV row into a typed command.
    ///
    /// Amount sign is not checked here; the engine rejects non-positive
    /// amounts itself.
    pub fn parse(&self) -> Result<Command> {
        let op = self.op.trim().to_lowercase();

        match op.as_str() {
            "open" => Ok(Command::Open {
                account: self.account()?,
                initial: self.optional_amount()?.unwrap_or(Money::ZERO),
            }),
            "deposit" => Ok(Command::Deposit {
                account: self.account()?,
                amount: self.amount()?,
            }),
            "withdrawal" | "withdraw" => Ok(Command::Withdrawal {
                account: self.account()?,
                amount: self.amount()?,
            }),
            "transfer" => Ok(Command::Transfer {
                from: self.account()?,
                to: Self::required(&self.counterparty, "counterparty")?,
                amount: self.amount()?,
            }),
            "reverse" => {
                let tx = self
                    .tx
                    .ok_or_else(|| LedgerError::InvalidCommand("reverse requires tx".to_string()))?;
                Ok(Command::Reverse { tx: TxId(tx) })
            }
            "close" => Ok(Command::Close {
                account: self.account()?,
            }),
            other => Err(LedgerError::InvalidCommand(format!(
                "unknown command type '{}'",
                other
            ))),
        }
    }

    fn account(&self) -> Result<AccountId> {
        Self::required(&self.account, "account")
    }

    fn required(field: &Option<String>, name: &str) -> Result<AccountId> {
        match field.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(AccountId::new(id)),
            _ => Err(LedgerError::InvalidCommand(format!("missing {}", name))),
        }
    }

    fn amount(&self) -> Result<Money> {
        self.optional_amount()?
            .ok_or_else(|| LedgerError::InvalidCommand("missing amount".to_string()))
    }

    fn optional_amount(&self) -> Result<Option<Money>> {
        match self.amount.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Money::from_str(s).map(Some),
            _ => Ok(None),
        }
    }
}
