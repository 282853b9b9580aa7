//! Integration tests for the banking ledger CLI.
//!
//! These tests run the actual binary and verify output against expected CSV files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

/// Run the binary with the given arguments and return stdout
fn run_ledger(args: &[&str]) -> String {
    let mut cmd = Command::cargo_bin("banking-ledger").unwrap();
    let assert = cmd.args(args).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Normalize CSV for comparison (sort lines, trim whitespace)
fn normalize_csv(csv: &str) -> Vec<String> {
    let mut lines: Vec<String> = csv
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();

    // Keep header first, sort the rest
    if lines.len() > 1 {
        let header = lines.remove(0);
        lines.sort();
        lines.insert(0, header);
    }

    lines
}

fn assert_matches_expected(sample: &str, expected: &str) {
    let output = run_ledger(&[&test_data_path(sample)]);
    let expected = fs::read_to_string(test_data_path(expected)).unwrap();
    assert_eq!(normalize_csv(&output), normalize_csv(&expected));
}

#[test]
fn test_sample_a_deposits_withdrawals_transfers() {
    assert_matches_expected("sample_a.csv", "expected_a.csv");
}

#[test]
fn test_sample_b_reversals() {
    assert_matches_expected("sample_b_reversal.csv", "expected_b.csv");
}

#[test]
fn test_sample_c_whitespace_handling() {
    assert_matches_expected("sample_c_whitespace.csv", "expected_c.csv");
}

#[test]
fn test_sample_d_edge_cases() {
    assert_matches_expected("sample_d_edge_cases.csv", "expected_d.csv");
}

#[test]
fn test_missing_file_error() {
    let mut cmd = Command::cargo_bin("banking-ledger").unwrap();
    cmd.arg("nonexistent.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error").or(predicate::str::contains("Error")));
}

#[test]
fn test_missing_argument_error() {
    let mut cmd = Command::cargo_bin("banking-ledger").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing input file"));
}

#[test]
fn test_output_has_correct_header() {
    let output = run_ledger(&[&test_data_path("sample_a.csv")]);
    assert!(output.starts_with("account,balance"));
}

#[test]
fn test_decimal_precision_two_places() {
    let output = run_ledger(&[&test_data_path("sample_a.csv")]);

    for line in output.lines().skip(1) {
        let parts: Vec<&str> = line.split(',').collect();
        assert_eq!(parts.len(), 2, "Unexpected row: {}", line);
        let dot_pos = parts[1].find('.').expect("balance has a decimal point");
        assert_eq!(
            parts[1].len() - dot_pos - 1,
            2,
            "Expected 2 decimal places in: {}",
            parts[1]
        );
    }
}

#[test]
fn test_journal_flag_lists_every_record() {
    let output = run_ledger(&[&test_data_path("sample_b_reversal.csv"), "--journal"]);
    let lines: Vec<&str> = output.lines().collect();

    assert!(lines[0].starts_with("transaction_id,account_id,type,amount,timestamp"));
    // 1 opening deposit, 2 transfer legs, 2 compensations, deposit,
    // withdrawal, and the withdrawal's compensation
    assert_eq!(lines.len(), 1 + 8);

    let transfer_out = lines
        .iter()
        .find(|l| l.starts_with("2,"))
        .expect("transfer_out leg present");
    assert!(transfer_out.contains(",a,transfer_out,60.00,"));
    assert!(transfer_out.contains(",true,,4"));

    let compensation = lines
        .iter()
        .find(|l| l.starts_with("4,"))
        .expect("compensation present");
    assert!(compensation.contains(",a,transfer_in,60.00,"));
    assert!(compensation.ends_with(",false,2,"));
}

#[test]
fn test_flag_position_does_not_matter() {
    let path = test_data_path("sample_a.csv");
    let before = run_ledger(&["--journal", &path]);
    let after = run_ledger(&[&path, "--journal"]);
    assert_eq!(before.lines().count(), after.lines().count());
}

#[test]
fn test_temp_file_input() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "type,account,counterparty,amount,tx").unwrap();
    writeln!(file, "open,t,,12.34,").unwrap();
    writeln!(file, "withdrawal,t,,2.34,").unwrap();
    file.flush().unwrap();

    let output = run_ledger(&[file.path().to_str().unwrap()]);
    assert_eq!(normalize_csv(&output), vec!["account,balance", "t,10.00"]);
}

#[test]
fn test_rejected_rows_are_logged() {
    let mut cmd = Command::cargo_bin("banking-ledger").unwrap();
    cmd.env("RUST_LOG", "warn")
        .arg(test_data_path("sample_d_edge_cases.csv"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Insufficient funds"))
        .stderr(predicate::str::contains("already exists"));
}
