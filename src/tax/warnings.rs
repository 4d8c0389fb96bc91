use crate::money::{format_rate, format_usd};
use crate::profile::VisaType;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Success,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Success => "SUCCESS",
        };
        write!(f, "{s}")
    }
}

/// Diagnostics raised while computing a return. None of these stop the
/// computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Social security or medicare withheld from a visa holder who is
    /// normally exempt from FICA.
    FicaWithheldInError {
        visa_type: VisaType,
        #[serde(with = "rust_decimal::serde::float")]
        #[schemars(with = "f64")]
        amount: Decimal,
    },
    TreatyExemptionApplied {
        country: String,
        article: Option<String>,
        #[serde(with = "rust_decimal::serde::float")]
        #[schemars(with = "f64")]
        amount: Decimal,
    },
    MissingTreatyDocumentation { country: String },
    StandardDeductionApplied {
        article: Option<String>,
        #[serde(with = "rust_decimal::serde::float")]
        #[schemars(with = "f64")]
        amount: Decimal,
    },
    /// Itemized deductions need Schedule A (Form 1040-NR).
    ItemizedDeductionsClaimed {
        #[serde(with = "rust_decimal::serde::float")]
        #[schemars(with = "f64")]
        amount: Decimal,
    },
    /// No treaty on file, investment income is taxed at the statutory rate.
    NoTreatyStatutoryRate {
        country: String,
        #[serde(with = "rust_decimal::serde::float")]
        #[schemars(with = "f64")]
        rate: Decimal,
    },
    CapitalGainsNotTaxed {
        #[serde(with = "rust_decimal::serde::float")]
        #[schemars(with = "f64")]
        amount: Decimal,
        days_present: u16,
        required_days: u16,
    },
    NecTaxDue {
        #[serde(with = "rust_decimal::serde::float")]
        #[schemars(with = "f64")]
        amount: Decimal,
    },
    ResidentAlien {
        #[serde(with = "rust_decimal::serde::float")]
        #[schemars(with = "f64")]
        weighted_days: Decimal,
    },
    ResidentAlienNoFica,
    StateHasNoIncomeTax {
        state: String,
        #[serde(with = "rust_decimal::serde::float")]
        #[schemars(with = "f64")]
        withheld: Decimal,
    },
    HighTaxStateNoWithholding { state: String },
    JointFilingNotPermitted,
    MissingEntryDate { visa_type: VisaType },
}

impl Warning {
    pub fn code(&self) -> &'static str {
        match self {
            Warning::FicaWithheldInError { .. } => "FICA_WITHHELD_IN_ERROR",
            Warning::TreatyExemptionApplied { .. } => "TREATY_EXEMPTION_APPLIED",
            Warning::MissingTreatyDocumentation { .. } => "MISSING_TREATY_DOCUMENTATION",
            Warning::StandardDeductionApplied { .. } => "STANDARD_DEDUCTION_APPLIED",
            Warning::ItemizedDeductionsClaimed { .. } => "ITEMIZED_DEDUCTIONS_CLAIMED",
            Warning::NoTreatyStatutoryRate { .. } => "NO_TREATY_STATUTORY_RATE",
            Warning::CapitalGainsNotTaxed { .. } => "CAPITAL_GAINS_NOT_TAXED",
            Warning::NecTaxDue { .. } => "NEC_TAX_DUE",
            Warning::ResidentAlien { .. } => "RESIDENT_ALIEN",
            Warning::ResidentAlienNoFica => "RESIDENT_ALIEN_NO_FICA",
            Warning::StateHasNoIncomeTax { .. } => "STATE_HAS_NO_INCOME_TAX",
            Warning::HighTaxStateNoWithholding { .. } => "HIGH_TAX_STATE_NO_WITHHOLDING",
            Warning::JointFilingNotPermitted => "JOINT_FILING_NOT_PERMITTED",
            Warning::MissingEntryDate { .. } => "MISSING_ENTRY_DATE",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Warning::FicaWithheldInError { .. }
            | Warning::ResidentAlien { .. }
            | Warning::MissingEntryDate { .. } => Severity::Critical,
            Warning::TreatyExemptionApplied { .. } | Warning::StandardDeductionApplied { .. } => {
                Severity::Success
            }
            Warning::ItemizedDeductionsClaimed { .. }
            | Warning::NoTreatyStatutoryRate { .. }
            | Warning::CapitalGainsNotTaxed { .. }
            | Warning::NecTaxDue { .. } => Severity::Info,
            Warning::MissingTreatyDocumentation { .. }
            | Warning::ResidentAlienNoFica
            | Warning::StateHasNoIncomeTax { .. }
            | Warning::HighTaxStateNoWithholding { .. }
            | Warning::JointFilingNotPermitted => Severity::Warning,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Warning::FicaWithheldInError { visa_type, amount } => format!(
                "{} of FICA (social security and medicare) was withheld, but {} visa holders are \
                 generally exempt. Ask your employer for a refund, or file Form 843 with Form 8316.",
                format_usd(*amount),
                visa_type
            ),
            Warning::TreatyExemptionApplied {
                country,
                article,
                amount,
            } => match article {
                Some(article) => format!(
                    "Treaty exemption of {} applied under the US-{} treaty, Article {}.",
                    format_usd(*amount),
                    country,
                    article
                ),
                None => format!(
                    "Treaty exemption of {} applied under the US-{} treaty.",
                    format_usd(*amount),
                    country
                ),
            },
            Warning::MissingTreatyDocumentation { country } => format!(
                "A US-{country} treaty benefit is claimed but no Form 8233 or treaty statement \
                 is on file. Attach the statement to Form 1040-NR."
            ),
            Warning::StandardDeductionApplied { article, amount } => match article {
                Some(article) => format!(
                    "Standard deduction of {} allowed by treaty Article {}.",
                    format_usd(*amount),
                    article
                ),
                None => format!("Standard deduction of {} allowed by treaty.", format_usd(*amount)),
            },
            Warning::ItemizedDeductionsClaimed { amount } => format!(
                "Itemized deductions of {} claimed. Schedule A (Form 1040-NR) is required.",
                format_usd(*amount)
            ),
            Warning::NoTreatyStatutoryRate { country, rate } => {
                let country = if country.is_empty() {
                    "your country of residence".to_string()
                } else {
                    country.clone()
                };
                format!(
                    "No tax treaty found for {}. Dividends, interest and capital gains are taxed \
                     at the statutory {} rate.",
                    country,
                    format_rate(*rate)
                )
            }
            Warning::CapitalGainsNotTaxed {
                amount,
                days_present,
                required_days,
            } => format!(
                "Capital gains of {} are not taxed: {} days present is fewer than {}.",
                format_usd(*amount),
                days_present,
                required_days
            ),
            Warning::NecTaxDue { amount } => format!(
                "{} of tax is due on income not effectively connected (Schedule NEC).",
                format_usd(*amount)
            ),
            Warning::ResidentAlien { weighted_days } => format!(
                "You meet the substantial presence test ({weighted_days} weighted days) and are a \
                 resident alien. Form 1040 applies; this nonresident estimate may not."
            ),
            Warning::ResidentAlienNoFica => {
                "Resident aliens owe FICA but none was withheld. Check with your employer."
                    .to_string()
            }
            Warning::StateHasNoIncomeTax { state, withheld } => format!(
                "{} of state tax was withheld, but {} has no state income tax. Ask your employer \
                 for a correction.",
                format_usd(*withheld),
                state
            ),
            Warning::HighTaxStateNoWithholding { state } => format!(
                "No state tax was withheld but {state} taxes income. You may owe state tax."
            ),
            Warning::JointFilingNotPermitted => {
                "Nonresident aliens cannot file jointly. Married Filing Separately rates were used."
                    .to_string()
            }
            Warning::MissingEntryDate { visa_type } => format!(
                "No US entry date given for a {visa_type} visa. The exempt individual period \
                 cannot be determined, so days were counted in full."
            ),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic {
            severity: self.severity(),
            code: self.code().to_string(),
            message: self.message(),
        }
    }
}

/// A warning as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}
