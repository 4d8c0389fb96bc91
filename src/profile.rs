use crate::error::ValidationError;
use crate::rules::TaxYear;
use chrono::NaiveDate;
use nrtax_derive::InputSchema;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// Maximum days in a calendar year.
const MAX_DAYS: i64 = 366;

/// Largest accepted money amount. Sums of every field stay well inside `Decimal` range.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum VisaType {
    F1,
    J1,
    H1B,
    Other,
}

impl VisaType {
    /// Student and exchange visitor categories, which get the exempt-individual
    /// window and usually carry treaty student articles.
    pub fn is_student_category(&self) -> bool {
        matches!(self, VisaType::F1 | VisaType::J1)
    }

    pub fn display(&self) -> &'static str {
        match self {
            VisaType::F1 => "F-1",
            VisaType::J1 => "J-1",
            VisaType::H1B => "H-1B",
            VisaType::Other => "Other",
        }
    }
}

impl fmt::Display for VisaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl FromStr for VisaType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_uppercase();
        match key.as_str() {
            "F1" => Ok(VisaType::F1),
            "J1" => Ok(VisaType::J1),
            "H1B" => Ok(VisaType::H1B),
            "OTHER" => Ok(VisaType::Other),
            _ => Err(ValidationError::UnknownVisaType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedSeparate,
    MarriedJoint,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 3] = [
        FilingStatus::Single,
        FilingStatus::MarriedSeparate,
        FilingStatus::MarriedJoint,
    ];

    pub fn display(&self) -> &'static str {
        match self {
            FilingStatus::Single => "Single",
            FilingStatus::MarriedSeparate => "Married Filing Separately",
            FilingStatus::MarriedJoint => "Married Filing Jointly",
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl FromStr for FilingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "single" | "s" => Ok(FilingStatus::Single),
            "marriedseparate" | "marriedfilingseparately" | "mfs" => {
                Ok(FilingStatus::MarriedSeparate)
            }
            "marriedjoint" | "marriedfilingjointly" | "mfj" => Ok(FilingStatus::MarriedJoint),
            _ => Err(ValidationError::UnknownFilingStatus(s.to_string())),
        }
    }
}

/// Days physically present in the US for the tax year and the two years before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, JsonSchema)]
pub struct PresenceDays {
    pub current: u16,
    pub prior: u16,
    pub two_prior: u16,
}

/// Describes one request field for the `schema fields` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputField {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// Raw request as sent by the wizard. Missing numeric fields default to zero;
/// everything else is checked by [`ProfileInput::to_profile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, InputSchema)]
pub struct ProfileInput {
    /// Tax year being filed (e.g. 2025)
    #[serde(default)]
    #[input(required)]
    pub tax_year: Option<i32>,
    /// F1, J1, H1B or OTHER (dashes and case are ignored)
    #[serde(default)]
    #[input(required)]
    pub visa_type: Option<String>,
    /// J-1 category: true for students, false for teachers/researchers/trainees (default true)
    #[serde(default)]
    pub is_student: Option<bool>,
    /// Country of tax residence, looked up in the treaty table
    #[serde(default)]
    pub country_of_residence: Option<String>,
    /// Single, MarriedSeparate or MarriedJoint (default Single)
    #[serde(default)]
    pub filing_status: Option<String>,
    /// Date of first US entry on the current visa (YYYY-MM-DD)
    #[serde(default)]
    pub entry_date: Option<String>,
    /// Two-letter US state of residence
    #[serde(default)]
    pub state: Option<String>,
    /// W-2 box 1 wages
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub wages: Option<Decimal>,
    /// W-2 box 2 federal income tax withheld
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub federal_tax_withheld: Option<Decimal>,
    /// W-2 box 4 social security tax withheld
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub social_security_tax_withheld: Option<Decimal>,
    /// W-2 box 6 medicare tax withheld
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub medicare_tax_withheld: Option<Decimal>,
    /// W-2 box 17 state income tax withheld
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub state_tax_withheld: Option<Decimal>,
    /// 1099-DIV dividends
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub dividend_income: Option<Decimal>,
    /// 1099-INT interest
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub interest_income: Option<Decimal>,
    /// 1099-B capital gains
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub capital_gains: Option<Decimal>,
    /// 1099-B capital losses, netted against gains
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub capital_losses: Option<Decimal>,
    /// Taxable scholarship income (1042-S)
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub scholarship_grants: Option<Decimal>,
    /// Taxable fellowship income (1042-S)
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub fellowship_grants: Option<Decimal>,
    /// Cash charitable contributions to US organizations
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub charitable_contributions: Option<Decimal>,
    /// Treaty wage exemption already used this year (e.g. with another employer)
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub treaty_exemption_claimed: Option<Decimal>,
    /// Whether Form 8233 or a treaty statement was filed (default true)
    #[serde(default)]
    pub treaty_documentation_filed: Option<bool>,
    /// Days present per calendar year, one key per year for the tax year and the two before it
    #[serde(flatten)]
    #[input(name = "days_present_<year>")]
    #[schemars(with = "BTreeMap<String, u16>")]
    pub other: BTreeMap<String, serde_json::Value>,
}

/// Validated, immutable input to the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxpayerProfile {
    pub tax_year: TaxYear,
    pub visa_type: VisaType,
    pub is_student: bool,
    pub country_of_residence: String,
    pub filing_status: FilingStatus,
    pub entry_date: Option<NaiveDate>,
    pub days_present: PresenceDays,
    pub state: Option<String>,
    pub wages: Decimal,
    pub federal_tax_withheld: Decimal,
    pub social_security_tax_withheld: Decimal,
    pub medicare_tax_withheld: Decimal,
    pub state_tax_withheld: Decimal,
    pub dividend_income: Decimal,
    pub interest_income: Decimal,
    pub capital_gains: Decimal,
    pub capital_losses: Decimal,
    pub scholarship_grants: Decimal,
    pub fellowship_grants: Decimal,
    pub charitable_contributions: Decimal,
    pub treaty_exemption_claimed: Decimal,
    pub treaty_documentation_filed: bool,
}

impl TaxpayerProfile {
    /// A profile with no income, no presence and no treaty country.
    pub fn new(tax_year: TaxYear, visa_type: VisaType) -> Self {
        TaxpayerProfile {
            tax_year,
            visa_type,
            is_student: true,
            country_of_residence: String::new(),
            filing_status: FilingStatus::Single,
            entry_date: None,
            days_present: PresenceDays::default(),
            state: None,
            wages: Decimal::ZERO,
            federal_tax_withheld: Decimal::ZERO,
            social_security_tax_withheld: Decimal::ZERO,
            medicare_tax_withheld: Decimal::ZERO,
            state_tax_withheld: Decimal::ZERO,
            dividend_income: Decimal::ZERO,
            interest_income: Decimal::ZERO,
            capital_gains: Decimal::ZERO,
            capital_losses: Decimal::ZERO,
            scholarship_grants: Decimal::ZERO,
            fellowship_grants: Decimal::ZERO,
            charitable_contributions: Decimal::ZERO,
            treaty_exemption_claimed: Decimal::ZERO,
            treaty_documentation_filed: true,
        }
    }

    /// Calendar years of US presence counted inclusively from the entry year,
    /// e.g. entry in 2021 makes 2025 the fifth year.
    pub fn calendar_years_in_us(&self) -> Option<u32> {
        let entry = self.entry_date?;
        let years = self.tax_year.0 - chrono::Datelike::year(&entry) + 1;
        u32::try_from(years).ok()
    }

    pub fn grant_income(&self) -> Decimal {
        self.scholarship_grants + self.fellowship_grants
    }

    pub fn fica_withheld(&self) -> Decimal {
        self.social_security_tax_withheld + self.medicare_tax_withheld
    }
}

/// Read a request from JSON.
pub fn read_profile_json<R: Read>(reader: R) -> Result<ProfileInput, serde_json::Error> {
    serde_json::from_reader(reader)
}

impl ProfileInput {
    /// Check every field and build a [`TaxpayerProfile`], collecting all issues
    /// rather than stopping at the first.
    pub fn to_profile(&self) -> Result<TaxpayerProfile, Vec<ValidationError>> {
        let mut issues = Vec::new();

        let tax_year = match self.tax_year {
            Some(year) => Some(TaxYear(year)),
            None => {
                issues.push(ValidationError::MissingField("tax_year"));
                None
            }
        };

        let visa_type = match self.visa_type.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.parse::<VisaType>().map_err(|e| issues.push(e)).ok(),
            _ => {
                issues.push(ValidationError::MissingField("visa_type"));
                None
            }
        };

        let filing_status = match self.filing_status.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s
                .parse::<FilingStatus>()
                .map_err(|e| issues.push(e))
                .unwrap_or_default(),
            _ => FilingStatus::Single,
        };

        let entry_date = match self.entry_date.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    issues.push(ValidationError::InvalidEntryDate(s.to_string()));
                    None
                }
            },
            _ => None,
        };

        if let (Some(date), Some(year)) = (entry_date, tax_year) {
            if date > year.end_date() {
                issues.push(ValidationError::EntryAfterTaxYear {
                    entry_date: date,
                    tax_year: year.0,
                });
            }
        }

        let days_present = tax_year
            .map(|year| PresenceDays {
                current: self.days_for(year, &mut issues),
                prior: self.days_for(year.previous(), &mut issues),
                two_prior: self.days_for(year.previous().previous(), &mut issues),
            })
            .unwrap_or_default();

        let mut amount = |field: &'static str, value: Option<Decimal>| {
            let value = value.unwrap_or(Decimal::ZERO);
            if value < Decimal::ZERO {
                issues.push(ValidationError::NegativeAmount { field, value });
            } else if value > MAX_AMOUNT {
                issues.push(ValidationError::AmountTooLarge {
                    field,
                    value,
                    max: MAX_AMOUNT,
                });
            }
            value
        };

        let wages = amount("wages", self.wages);
        let federal_tax_withheld = amount("federal_tax_withheld", self.federal_tax_withheld);
        let social_security_tax_withheld =
            amount("social_security_tax_withheld", self.social_security_tax_withheld);
        let medicare_tax_withheld = amount("medicare_tax_withheld", self.medicare_tax_withheld);
        let state_tax_withheld = amount("state_tax_withheld", self.state_tax_withheld);
        let dividend_income = amount("dividend_income", self.dividend_income);
        let interest_income = amount("interest_income", self.interest_income);
        let capital_gains = amount("capital_gains", self.capital_gains);
        let capital_losses = amount("capital_losses", self.capital_losses);
        let scholarship_grants = amount("scholarship_grants", self.scholarship_grants);
        let fellowship_grants = amount("fellowship_grants", self.fellowship_grants);
        let charitable_contributions =
            amount("charitable_contributions", self.charitable_contributions);
        let treaty_exemption_claimed =
            amount("treaty_exemption_claimed", self.treaty_exemption_claimed);

        let (Some(tax_year), Some(visa_type)) = (tax_year, visa_type) else {
            return Err(issues);
        };
        if !issues.is_empty() {
            return Err(issues);
        }

        Ok(TaxpayerProfile {
            tax_year,
            visa_type,
            is_student: self.is_student.unwrap_or(true),
            country_of_residence: self
                .country_of_residence
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            filing_status,
            entry_date,
            days_present,
            state: self
                .state
                .as_deref()
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty()),
            wages,
            federal_tax_withheld,
            social_security_tax_withheld,
            medicare_tax_withheld,
            state_tax_withheld,
            dividend_income,
            interest_income,
            capital_gains,
            capital_losses,
            scholarship_grants,
            fellowship_grants,
            charitable_contributions,
            treaty_exemption_claimed,
            treaty_documentation_filed: self.treaty_documentation_filed.unwrap_or(true),
        })
    }

    fn days_for(&self, year: TaxYear, issues: &mut Vec<ValidationError>) -> u16 {
        let field = format!("days_present_{}", year.0);
        let value = match self.other.get(&field) {
            None | Some(serde_json::Value::Null) => return 0,
            Some(value) => value,
        };
        let days = match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            _ => None,
        };
        match days {
            Some(days) if (0..=MAX_DAYS).contains(&days) => days as u16,
            _ => {
                issues.push(ValidationError::DaysOutOfRange {
                    field,
                    value: value.to_string(),
                });
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: serde_json::Value) -> ProfileInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn visa_type_parsing_ignores_case_and_dashes() {
        assert_eq!("F1".parse::<VisaType>(), Ok(VisaType::F1));
        assert_eq!("f-1".parse::<VisaType>(), Ok(VisaType::F1));
        assert_eq!("J 1".parse::<VisaType>(), Ok(VisaType::J1));
        assert_eq!("H-1B".parse::<VisaType>(), Ok(VisaType::H1B));
        assert_eq!("other".parse::<VisaType>(), Ok(VisaType::Other));
        assert_eq!(
            "B2".parse::<VisaType>(),
            Err(ValidationError::UnknownVisaType("B2".to_string()))
        );
    }

    #[test]
    fn filing_status_parsing() {
        assert_eq!("Single".parse::<FilingStatus>(), Ok(FilingStatus::Single));
        assert_eq!(
            "Married Filing Separately".parse::<FilingStatus>(),
            Ok(FilingStatus::MarriedSeparate)
        );
        assert_eq!("MFJ".parse::<FilingStatus>(), Ok(FilingStatus::MarriedJoint));
        assert_eq!(
            "married_joint".parse::<FilingStatus>(),
            Ok(FilingStatus::MarriedJoint)
        );
        assert!("Head of Household".parse::<FilingStatus>().is_err());
    }

    #[test]
    fn missing_numeric_fields_default_to_zero() {
        let profile = input(json!({ "tax_year": 2025, "visa_type": "F1" }))
            .to_profile()
            .unwrap();
        assert_eq!(profile.wages, Decimal::ZERO);
        assert_eq!(profile.dividend_income, Decimal::ZERO);
        assert_eq!(profile.days_present, PresenceDays::default());
        assert_eq!(profile.filing_status, FilingStatus::Single);
        assert!(profile.is_student);
        assert!(profile.treaty_documentation_filed);
    }

    #[test]
    fn null_amounts_are_zero() {
        let profile = input(json!({ "tax_year": 2025, "visa_type": "F1", "wages": null }))
            .to_profile()
            .unwrap();
        assert_eq!(profile.wages, Decimal::ZERO);
    }

    #[test]
    fn days_present_read_for_tax_year_and_two_prior() {
        let profile = input(json!({
            "tax_year": 2025,
            "visa_type": "H1B",
            "days_present_2025": 120,
            "days_present_2024": 150,
            "days_present_2023": 10,
            "days_present_2022": 365,
            "full_name": "Ignored Field"
        }))
        .to_profile()
        .unwrap();
        assert_eq!(
            profile.days_present,
            PresenceDays {
                current: 120,
                prior: 150,
                two_prior: 10
            }
        );
    }

    #[test]
    fn amounts_accept_strings_and_numbers() {
        let profile = input(json!({
            "tax_year": 2025,
            "visa_type": "F1",
            "wages": 20000.55,
            "federal_tax_withheld": "2000.10"
        }))
        .to_profile()
        .unwrap();
        assert_eq!(profile.wages, dec!(20000.55));
        assert_eq!(profile.federal_tax_withheld, dec!(2000.10));
    }

    #[test]
    fn collects_every_issue() {
        let issues = input(json!({
            "tax_year": 2025,
            "visa_type": "B2",
            "wages": -1,
            "days_present_2025": 400,
            "entry_date": "08/01/2021"
        }))
        .to_profile()
        .unwrap_err();

        assert!(issues.contains(&ValidationError::UnknownVisaType("B2".to_string())));
        assert!(issues.contains(&ValidationError::NegativeAmount {
            field: "wages",
            value: dec!(-1)
        }));
        assert!(issues.contains(&ValidationError::DaysOutOfRange {
            field: "days_present_2025".to_string(),
            value: "400".to_string()
        }));
        assert!(issues.contains(&ValidationError::InvalidEntryDate("08/01/2021".to_string())));
        assert_eq!(issues.len(), 4);
    }

    #[test]
    fn oversized_amounts_rejected() {
        let issues = input(json!({
            "tax_year": 2025,
            "visa_type": "F1",
            "scholarship_grants": "50000000000000000000000000000",
            "fellowship_grants": "50000000000000000000000000000",
            "wages": "1000000000000000"
        }))
        .to_profile()
        .unwrap_err();
        assert_eq!(
            issues,
            vec![
                ValidationError::AmountTooLarge {
                    field: "scholarship_grants",
                    value: dec!(50000000000000000000000000000),
                    max: MAX_AMOUNT,
                },
                ValidationError::AmountTooLarge {
                    field: "fellowship_grants",
                    value: dec!(50000000000000000000000000000),
                    max: MAX_AMOUNT,
                },
            ]
        );
    }

    #[test]
    fn fractional_or_negative_days_rejected() {
        let issues = input(json!({
            "tax_year": 2025,
            "visa_type": "F1",
            "days_present_2024": 12.5,
            "days_present_2023": -3
        }))
        .to_profile()
        .unwrap_err();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn missing_tax_year_and_visa_type_rejected() {
        let issues = input(json!({ "wages": 100 })).to_profile().unwrap_err();
        assert_eq!(
            issues,
            vec![
                ValidationError::MissingField("tax_year"),
                ValidationError::MissingField("visa_type"),
            ]
        );
    }

    #[test]
    fn entry_after_tax_year_rejected() {
        let issues = input(json!({
            "tax_year": 2024,
            "visa_type": "F1",
            "entry_date": "2025-01-10"
        }))
        .to_profile()
        .unwrap_err();
        assert_eq!(
            issues,
            vec![ValidationError::EntryAfterTaxYear {
                entry_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
                tax_year: 2024
            }]
        );
    }

    #[test]
    fn calendar_years_counted_inclusively() {
        let mut profile = TaxpayerProfile::new(TaxYear(2025), VisaType::F1);
        assert_eq!(profile.calendar_years_in_us(), None);
        profile.entry_date = NaiveDate::from_ymd_opt(2021, 8, 1);
        assert_eq!(profile.calendar_years_in_us(), Some(5));
        profile.entry_date = NaiveDate::from_ymd_opt(2025, 1, 2);
        assert_eq!(profile.calendar_years_in_us(), Some(1));
    }

    #[test]
    fn input_schema_documents_fields() {
        let fields = ProfileInput::input_schema();
        let tax_year = fields.iter().find(|f| f.name == "tax_year").unwrap();
        assert!(tax_year.required);
        let wages = fields.iter().find(|f| f.name == "wages").unwrap();
        assert!(!wages.required);
        assert_eq!(wages.description, "W-2 box 1 wages");
        assert!(fields.iter().any(|f| f.name == "days_present_<year>"));
    }
}
