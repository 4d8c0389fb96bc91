use crate::profile::VisaType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How a wage exemption ceiling is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExemptionMode {
    /// Exempt up to the ceiling.
    #[default]
    Cap,
    /// Exempt in full, but only while wages stay at or below the ceiling.
    Threshold,
}

fn default_eligible_visas() -> Vec<VisaType> {
    vec![VisaType::F1, VisaType::J1]
}

/// Treaty benefits for one country of residence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatyEntry {
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub wage_exemption: Option<Decimal>,
    #[serde(default)]
    pub wage_exemption_mode: ExemptionMode,
    #[serde(default)]
    pub wage_exemption_article: Option<String>,
    /// Calendar years from entry during which the student article applies.
    #[serde(default)]
    pub max_years: Option<u32>,
    #[serde(default)]
    pub scholarship_exempt: bool,
    #[serde(default)]
    pub scholarship_article: Option<String>,
    #[serde(default)]
    pub standard_deduction: bool,
    #[serde(default)]
    pub standard_deduction_article: Option<String>,
    #[serde(default)]
    pub dividend_rate: Option<Decimal>,
    #[serde(default)]
    pub interest_rate: Option<Decimal>,
    #[serde(default)]
    pub capital_gains_rate: Option<Decimal>,
    #[serde(default = "default_eligible_visas")]
    pub eligible_visas: Vec<VisaType>,
}

impl TreatyEntry {
    pub fn covers(&self, visa_type: VisaType) -> bool {
        self.eligible_visas.contains(&visa_type)
    }

    pub(crate) fn validate(&self, country: &str) -> Result<(), crate::ConfigError> {
        let invalid = |reason: String| crate::ConfigError::InvalidTreaty {
            country: country.to_string(),
            reason,
        };
        if let Some(ceiling) = self.wage_exemption {
            if ceiling < Decimal::ZERO {
                return Err(invalid(format!("negative wage exemption {ceiling}")));
            }
        }
        let rates = [
            ("dividend", self.dividend_rate),
            ("interest", self.interest_rate),
            ("capital gains", self.capital_gains_rate),
        ];
        for (name, rate) in rates {
            if let Some(rate) = rate {
                if rate < Decimal::ZERO || rate > Decimal::ONE {
                    return Err(invalid(format!("{name} rate {rate} outside [0, 1]")));
                }
            }
        }
        Ok(())
    }
}

/// Country names are matched ignoring case and surrounding whitespace.
fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct RawTreatyTable {
    version: String,
    countries: BTreeMap<String, TreatyEntry>,
}

/// Versioned country → treaty table with a case-insensitive name and alias index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "RawTreatyTable", into = "RawTreatyTable")]
pub struct TreatyTable {
    version: String,
    countries: BTreeMap<String, TreatyEntry>,
    index: HashMap<String, String>,
}

impl From<RawTreatyTable> for TreatyTable {
    fn from(raw: RawTreatyTable) -> Self {
        TreatyTable::new(raw.version, raw.countries)
    }
}

impl From<TreatyTable> for RawTreatyTable {
    fn from(table: TreatyTable) -> Self {
        RawTreatyTable {
            version: table.version,
            countries: table.countries,
        }
    }
}

impl TreatyTable {
    pub fn new(version: impl Into<String>, countries: BTreeMap<String, TreatyEntry>) -> Self {
        let mut index = HashMap::new();
        for (name, entry) in &countries {
            index.insert(normalize(name), name.clone());
            for alias in &entry.aliases {
                index.entry(normalize(alias)).or_insert_with(|| name.clone());
            }
        }
        TreatyTable {
            version: version.into(),
            countries,
            index,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Find the entry for a country of residence, returning its canonical name.
    pub fn lookup(&self, country: &str) -> Option<(&str, &TreatyEntry)> {
        let name = self.index.get(&normalize(country))?;
        self.countries
            .get_key_value(name)
            .map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreatyEntry)> {
        self.countries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub(crate) fn validate(&self) -> Result<(), crate::ConfigError> {
        self.iter().try_for_each(|(name, entry)| entry.validate(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn table() -> TreatyTable {
        serde_json::from_str(
            r#"{
                "version": "test",
                "countries": {
                    "South Korea": {
                        "aliases": ["Korea", "Republic of Korea"],
                        "wage_exemption": 2000,
                        "dividend_rate": 0.10
                    },
                    "Canada": {
                        "wage_exemption": 10000,
                        "wage_exemption_mode": "threshold"
                    }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn lookup_ignores_case_and_spacing() {
        let table = table();
        let (name, entry) = table.lookup("  south   KOREA ").unwrap();
        assert_eq!(name, "South Korea");
        assert_eq!(entry.wage_exemption, Some(dec!(2000)));
        assert_eq!(entry.dividend_rate, Some(dec!(0.10)));
    }

    #[test]
    fn lookup_by_alias() {
        let table = table();
        assert_eq!(table.lookup("republic of korea").map(|(n, _)| n), Some("South Korea"));
        assert!(table.lookup("Brazil").is_none());
        assert!(table.lookup("").is_none());
    }

    #[test]
    fn entry_defaults() {
        let table = table();
        let (_, canada) = table.lookup("Canada").unwrap();
        assert_eq!(canada.wage_exemption_mode, ExemptionMode::Threshold);
        assert_eq!(canada.eligible_visas, vec![VisaType::F1, VisaType::J1]);
        assert!(canada.covers(VisaType::J1));
        assert!(!canada.covers(VisaType::H1B));
        assert!(!canada.standard_deduction);
    }

    #[test]
    fn rejects_rate_above_one() {
        let mut countries = BTreeMap::new();
        countries.insert(
            "Nowhere".to_string(),
            TreatyEntry {
                dividend_rate: Some(dec!(1.25)),
                ..table().lookup("Canada").unwrap().1.clone()
            },
        );
        assert!(TreatyTable::new("bad", countries).validate().is_err());
    }
}
