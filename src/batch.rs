//! Streaming batch processor.
//!
//! Reads command rows from CSV, applies them to a [`LedgerEngine`] in order
//! and writes either final balances or the full journal. A row that fails
//! to parse or is rejected by the engine is logged and skipped; it never
//! aborts the batch.

use crate::command::{Command, CommandRecord};
use crate::engine::LedgerEngine;
use crate::error::{LedgerError, Result};
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use std::io::{Read, Write};

/// Counts of rows applied and rejected in one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub applied: usize,
    pub rejected: usize,
}

/// Applies CSV command batches to a ledger.
#[derive(Default)]
pub struct BatchProcessor {
    engine: LedgerEngine,
}

impl BatchProcessor {
    /// Creates a processor over a new empty ledger.
    pub fn new() -> Self {
        BatchProcessor {
            engine: LedgerEngine::new(),
        }
    }

    pub fn engine(&self) -> &LedgerEngine {
        &self.engine
    }

    /// Processes commands from a CSV reader in streaming fashion.
    ///
    /// Records are read one at a time. Invalid or rejected rows are logged
    /// at warn level and counted in the returned summary.
    pub fn process_csv<R: Read>(&self, reader: R) -> Result<BatchSummary> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut summary = BatchSummary::default();
        for (row_idx, result) in csv_reader.deserialize::<CommandRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            let outcome = result
                .map_err(LedgerError::from)
                .and_then(|record| record.parse())
                .and_then(|command| self.apply(command, row_num));

            match outcome {
                Ok(()) => summary.applied += 1,
                Err(e) => {
                    warn!("Row {}: {}", row_num, e);
                    summary.rejected += 1;
                }
            }
        }

        debug!(
            "Batch done: {} applied, {} rejected",
            summary.applied, summary.rejected
        );
        Ok(summary)
    }

    /// Applies a single parsed command.
    fn apply(&self, command: Command, row: usize) -> Result<()> {
        match command {
            Command::Open { account, initial } => {
                self.engine.create_account(account, None, initial)?;
            }
            Command::Deposit { account, amount } => {
                let receipt = self.engine.deposit(&account, amount)?;
                debug!("Row {}: tx {}", row, receipt.transaction_id);
            }
            Command::Withdrawal { account, amount } => {
                let receipt = self.engine.withdraw(&account, amount)?;
                debug!("Row {}: tx {}", row, receipt.transaction_id);
            }
            Command::Transfer { from, to, amount } => {
                let receipt = self.engine.transfer(&from, &to, amount)?;
                debug!(
                    "Row {}: tx {}/{} group {}",
                    row, receipt.out_id, receipt.in_id, receipt.group
                );
            }
            Command::Reverse { tx } => {
                self.engine.reverse(tx)?;
            }
            Command::Close { account } => {
                self.engine.delete_account(&account)?;
            }
        }
        Ok(())
    }

    /// Writes final balances as CSV.
    ///
    /// Output is sorted by account id, with exactly 2 decimal places.
    pub fn write_balances<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["account", "balance"])?;
        for account in self.engine.accounts() {
            csv_writer.write_record([account.id.to_string(), account.balance.to_string()])?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Writes every transaction record as CSV, in id order.
    pub fn write_journal<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let journal = self.engine.journal();
        if journal.is_empty() {
            csv_writer.write_record(JOURNAL_HEADER)?;
        }
        for record in &journal {
            csv_writer.serialize(record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

/// Column names of the journal output; `serialize` derives the same header
/// from the record fields when at least one row is written.
const JOURNAL_HEADER: [&str; 9] = [
    "transaction_id",
    "account_id",
    "type",
    "amount",
    "timestamp",
    "transfer_group_id",
    "is_reversed",
    "reversal_of_id",
    "reversed_by_id",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn process_csv_str(csv: &str) -> BatchProcessor {
        let processor = BatchProcessor::new();
        processor.process_csv(Cursor::new(csv)).unwrap();
        processor
    }

    fn balances(processor: &BatchProcessor) -> String {
        let mut output = Vec::new();
        processor.write_balances(&mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_open_and_deposit() {
        let csv = r#"type,account,counterparty,amount,tx
open,a,,,
deposit,a,,100,"#;

        let processor = process_csv_str(csv);
        let account = processor.engine().account(&"a".into()).unwrap();
        assert_eq!(account.balance.to_string(), "100.00");
    }

    #[test]
    fn test_transfer_and_reverse() {
        let csv = r#"type,account,counterparty,amount,tx
open,a,,100,
open,b,,,
transfer,a,b,60,
reverse,,,,2"#;

        let processor = process_csv_str(csv);
        let output = balances(&processor);
        assert!(output.contains("a,100.00"));
        assert!(output.contains("b,0.00"));
    }

    #[test]
    fn test_rejected_rows_are_counted_and_skipped() {
        let csv = r#"type,account,counterparty,amount,tx
open,a,,100,
withdrawal,a,,150,
deposit,ghost,,1,
bogus,a,,1,
deposit,a,,0.001,
withdrawal,a,,25,"#;

        let processor = BatchProcessor::new();
        let summary = processor.process_csv(Cursor::new(csv)).unwrap();
        assert_eq!(summary, BatchSummary { applied: 2, rejected: 4 });
        assert!(balances(&processor).contains("a,75.00"));
    }

    #[test]
    fn test_whitespace_handling() {
        let csv = r#"type, account, counterparty, amount, tx
open, a, , 10.0,
withdrawal, a, , 3.0,"#;

        let processor = process_csv_str(csv);
        assert!(balances(&processor).contains("a,7.00"));
    }

    #[test]
    fn test_balances_output_format() {
        let csv = r#"type,account,counterparty,amount,tx
open,b,,2,
open,a,,1.5,"#;

        let output = balances(&process_csv_str(csv));
        assert_eq!(output, "account,balance\na,1.50\nb,2.00\n");
    }

    #[test]
    fn test_journal_output() {
        let csv = r#"type,account,counterparty,amount,tx
open,a,,100,
open,b,,,
transfer,a,b,60,"#;

        let processor = process_csv_str(csv);
        let mut output = Vec::new();
        processor.write_journal(&mut output).unwrap();
        let output = String::from_utf8(output).unwrap();

        let mut lines = output.lines();
        assert_eq!(lines.next().unwrap(), JOURNAL_HEADER.join(","));
        assert!(output.contains(",a,deposit,100.00,"));
        assert!(output.contains(",a,transfer_out,60.00,"));
        assert!(output.contains(",b,transfer_in,60.00,"));
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn test_empty_journal_has_header() {
        let processor = BatchProcessor::new();
        let mut output = Vec::new();
        processor.write_journal(&mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap().trim_end(),
            JOURNAL_HEADER.join(",")
        );
    }
}
