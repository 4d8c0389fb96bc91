//! Tax estimates for US nonresident aliens (F-1, J-1, H-1B).
//!
//! The pipeline turns a validated [`TaxpayerProfile`] into a
//! [`TaxComputationResult`]: residency classification, treaty benefits, income
//! aggregation, bracket tax on effectively connected income, flat tax on
//! Schedule NEC income, then reconciliation against withholding.

pub mod error;
pub mod money;
pub mod profile;
pub mod rules;
pub mod tax;

pub use error::{ConfigError, EngineError, ValidationError};
pub use profile::{FilingStatus, InputField, PresenceDays, ProfileInput, TaxpayerProfile, VisaType};
pub use rules::{RuleBook, TaxYear, TaxYearConfig};
pub use tax::{compute, Diagnostic, Severity, TaxComputationResult, Warning};

/// Validate a request and run the pipeline against the matching tax year rules.
pub fn calculate(
    input: &ProfileInput,
    rules: &RuleBook,
) -> Result<TaxComputationResult, EngineError> {
    let profile = input.to_profile().map_err(EngineError::Validation)?;
    let config = rules.for_year(profile.tax_year)?;
    Ok(compute(&profile, config))
}
