//! Banking Ledger CLI
//!
//! Applies a CSV batch of ledger commands and prints the final account
//! balances, or the full transaction journal with `--journal`.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv > balances.csv
//! cargo run -- commands.csv --journal > journal.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use banking_ledger::{BatchProcessor, LedgerError, Result};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let journal = args.iter().any(|a| a == "--journal");
    let input_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .ok_or(LedgerError::MissingArgument)?;

    let file = File::open(input_path)?;
    let reader = BufReader::new(file);

    let processor = BatchProcessor::new();
    processor.process_csv(reader)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    if journal {
        processor.write_journal(handle)?;
    } else {
        processor.write_balances(handle)?;
    }

    Ok(())
}
