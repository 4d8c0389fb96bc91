use crate::profile::FilingStatus;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;

/// A problem with a single request field. Requests with any of these are
/// rejected before computation.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("{field} must not be negative: {value}")]
    NegativeAmount { field: &'static str, value: Decimal },
    #[error("{field} exceeds the largest supported amount of {max}: {value}")]
    AmountTooLarge {
        field: &'static str,
        value: Decimal,
        max: Decimal,
    },
    #[error("{field} must be a whole number of days between 0 and 366: {value}")]
    DaysOutOfRange { field: String, value: String },
    #[error("unknown visa type '{0}' (expected F1, J1, H1B or OTHER)")]
    UnknownVisaType(String),
    #[error("unknown filing status '{0}' (expected Single, MarriedSeparate or MarriedJoint)")]
    UnknownFilingStatus(String),
    #[error("invalid entry date '{0}' (expected YYYY-MM-DD)")]
    InvalidEntryDate(String),
    #[error("entry date {entry_date} is after the end of tax year {tax_year}")]
    EntryAfterTaxYear { entry_date: NaiveDate, tax_year: i32 },
}

/// Rule book loading and lookup failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no rules configured for tax year {0}")]
    UnsupportedTaxYear(i32),
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rules: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid bracket schedule for {year} ({filing_status}): {reason}")]
    InvalidSchedule {
        year: i32,
        filing_status: FilingStatus,
        reason: String,
    },
    #[error("invalid rules for tax year {year}: {reason}")]
    InvalidYear { year: i32, reason: String },
    #[error("invalid treaty entry for {country}: {reason}")]
    InvalidTreaty { country: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid taxpayer profile: {}", join_issues(.0))]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

fn join_issues(issues: &[ValidationError]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
