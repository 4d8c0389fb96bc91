//! E2E tests for the nrtax binary

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn nrtax(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nrtax"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Calculate prints the summary table and warnings
#[test]
fn calculate_table() {
    let output = nrtax(&["calculate", "-p", "tests/data/china_f1.json"]);
    let stdout = stdout(&output);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("TAX ESTIMATE (2024, Single)"));
    assert!(stdout.contains("Treaty: US-China"));
    assert!(stdout.contains("$5168.00"));
    assert!(stdout.contains("$732.00"));
    assert!(stdout.contains("SCHEDULE NEC"));
    assert!(stdout.contains("[CRITICAL] FICA_WITHHELD_IN_ERROR"));
}

/// Calculate JSON output matches the library result
#[test]
fn calculate_json() {
    let output = nrtax(&["calculate", "-p", "tests/data/india_f1.json", "--json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["taxable_income"], 35400.0);
    assert_eq!(json["wage_tax"], 4016.0);
    assert_eq!(json["owe"], 16.0);
    assert_eq!(json["refund"], 0.0);
    assert_eq!(json["deduction_kind"], "standard");
    assert_eq!(json["warnings"][0]["code"], "STANDARD_DEDUCTION_APPLIED");
}

#[test]
fn calculate_csv() {
    let output = nrtax(&["calculate", "-p", "tests/data/f1_no_treaty.json", "--csv"]);
    let stdout = stdout(&output);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.starts_with("line,amount"));
    assert!(stdout.contains("Wage tax,2161.50"));
    assert!(stdout.contains("Amount owed,161.50"));
}

#[test]
fn calculate_from_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_nrtax"))
        .args(["calculate", "--json"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn command");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(br#"{"tax_year": 2025, "visa_type": "H1B", "wages": 11925}"#)
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["wage_tax"], 1192.5);
}

#[test]
fn calculate_rejects_invalid_profile() {
    let output = nrtax(&["calculate", "-p", "tests/data/invalid.json"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("invalid taxpayer profile"));
    assert!(stderr.contains("unknown visa type 'B2'"));
}

#[test]
fn calculate_rejects_unsupported_year() {
    let output = nrtax(&["calculate", "-p", "tests/data/unsupported_year.json"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("no rules configured for tax year 2019"));
}

#[test]
fn validate_clean_profile() {
    let output = nrtax(&["validate", "-p", "tests/data/f1_no_treaty.json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout(&output).contains("No issues found."));
}

/// Validate lists every issue and exits 1
#[test]
fn validate_reports_issues() {
    let output = nrtax(&["validate", "-p", "tests/data/invalid.json", "--json"]);
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["issue_count"], 3);
}

#[test]
fn validate_unsupported_year() {
    let output = nrtax(&["validate", "-p", "tests/data/unsupported_year.json"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("no rules configured for tax year 2019"));
}

#[test]
fn schema_outputs() {
    let output = nrtax(&["schema"]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["title"], "ProfileInput");

    let output = nrtax(&["schema", "result-schema"]);
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["title"], "TaxComputationResult");

    let output = nrtax(&["schema", "fields"]);
    let stdout = stdout(&output);
    assert!(stdout.contains("days_present_<year>"));
    assert!(stdout.contains("(required)"));
}

#[test]
fn treaties_table() {
    let output = nrtax(&["treaties"]);
    let stdout = stdout(&output);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("TAX TREATIES (table 2025.1, 2025 rates)"));
    assert!(stdout.contains("South Korea"));
    assert!(stdout.contains("$10000.00 (threshold)"));
    assert!(stdout.contains("Art. 21(2)"));
}

#[test]
fn brackets_for_year_and_status() {
    let output = nrtax(&["brackets", "-y", "2024", "-f", "married-joint"]);
    let stdout = stdout(&output);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("TAX BRACKETS (2024, Married Filing Jointly)"));
    assert!(stdout.contains("$23200.00"));
    assert!(stdout.contains("$29200.00"));
}

#[test]
fn brackets_unknown_year_fails() {
    let output = nrtax(&["brackets", "-y", "2001"]);
    assert!(!output.status.success());
}
