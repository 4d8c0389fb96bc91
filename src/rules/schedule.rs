use crate::profile::FilingStatus;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// US tax year, which follows the calendar year.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct TaxYear(pub i32);

impl TaxYear {
    /// 31 December
    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 12, 31).unwrap_or(NaiveDate::MAX)
    }

    pub fn previous(&self) -> TaxYear {
        TaxYear(self.0 - 1)
    }
}

impl fmt::Display for TaxYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One marginal bracket. `up_to` is the inclusive upper bound of taxable
/// income at this rate, `None` for the top bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    #[serde(default)]
    pub up_to: Option<Decimal>,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerFilingStatus<T> {
    pub single: T,
    pub married_separate: T,
    pub married_joint: T,
}

impl<T> PerFilingStatus<T> {
    pub fn get(&self, filing_status: FilingStatus) -> &T {
        match filing_status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedSeparate => &self.married_separate,
            FilingStatus::MarriedJoint => &self.married_joint,
        }
    }
}

fn default_spt_threshold_days() -> u16 {
    183
}

fn default_spt_min_current_year_days() -> u16 {
    31
}

fn default_student_exempt_years() -> u32 {
    5
}

fn default_teacher_trainee_exempt_years() -> u32 {
    2
}

fn default_capital_gains_presence_days() -> u16 {
    183
}

/// Everything the engine needs for one tax year apart from treaties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSchedule {
    pub brackets: PerFilingStatus<Vec<Bracket>>,
    pub standard_deduction: PerFilingStatus<Decimal>,
    pub statutory_nec_rate: Decimal,
    #[serde(default = "default_spt_threshold_days")]
    pub spt_threshold_days: u16,
    #[serde(default = "default_spt_min_current_year_days")]
    pub spt_min_current_year_days: u16,
    /// Calendar years an F-1 or J-1 student is exempt from counting days.
    #[serde(default = "default_student_exempt_years")]
    pub student_exempt_years: u32,
    /// Calendar years a J-1 teacher, researcher or trainee is exempt.
    #[serde(default = "default_teacher_trainee_exempt_years")]
    pub teacher_trainee_exempt_years: u32,
    #[serde(default = "default_capital_gains_presence_days")]
    pub capital_gains_presence_days: u16,
    #[serde(default)]
    pub no_income_tax_states: Vec<String>,
    #[serde(default)]
    pub high_tax_states: Vec<String>,
}

impl YearSchedule {
    pub fn brackets(&self, filing_status: FilingStatus) -> &[Bracket] {
        self.brackets.get(filing_status)
    }

    pub fn standard_deduction(&self, filing_status: FilingStatus) -> Decimal {
        *self.standard_deduction.get(filing_status)
    }

    pub fn has_no_income_tax(&self, state: &str) -> bool {
        self.no_income_tax_states
            .iter()
            .any(|s| s.eq_ignore_ascii_case(state))
    }

    pub fn is_high_tax(&self, state: &str) -> bool {
        self.high_tax_states
            .iter()
            .any(|s| s.eq_ignore_ascii_case(state))
    }

    /// Check bracket ordering and rates for every filing status.
    pub(crate) fn validate(&self, year: i32) -> Result<(), crate::ConfigError> {
        use crate::ConfigError;

        let in_unit_range = |rate: Decimal| rate >= Decimal::ZERO && rate <= Decimal::ONE;
        if !in_unit_range(self.statutory_nec_rate) {
            return Err(ConfigError::InvalidYear {
                year,
                reason: format!("statutory NEC rate {} outside [0, 1]", self.statutory_nec_rate),
            });
        }

        for filing_status in FilingStatus::ALL {
            let invalid = |reason: String| ConfigError::InvalidSchedule {
                year,
                filing_status,
                reason,
            };
            let brackets = self.brackets(filing_status);
            let Some((last, rest)) = brackets.split_last() else {
                return Err(invalid("no brackets".to_string()));
            };
            if last.up_to.is_some() {
                return Err(invalid("last bracket must be unbounded".to_string()));
            }
            let mut previous = Decimal::ZERO;
            for bracket in rest {
                let Some(up_to) = bracket.up_to else {
                    return Err(invalid("only the last bracket may be unbounded".to_string()));
                };
                if up_to <= previous {
                    return Err(invalid(format!(
                        "bracket bounds must be strictly ascending ({up_to} after {previous})"
                    )));
                }
                previous = up_to;
            }
            if let Some(bracket) = brackets.iter().find(|b| !in_unit_range(b.rate)) {
                return Err(invalid(format!("rate {} outside [0, 1]", bracket.rate)));
            }
            if self.standard_deduction(filing_status) < Decimal::ZERO {
                return Err(invalid("negative standard deduction".to_string()));
            }
        }
        Ok(())
    }
}
