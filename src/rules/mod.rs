//! Per-year tax rules and the treaty table, loaded once and read-only afterwards.

mod schedule;
mod treaty;

pub use schedule::{Bracket, PerFilingStatus, TaxYear, YearSchedule};
pub use treaty::{ExemptionMode, TreatyEntry, TreatyTable};

use crate::error::ConfigError;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

const BUILTIN_RULES: &str = include_str!("../../rules/default.json");

#[derive(Debug, Deserialize)]
struct RawRuleBook {
    treaties: TreatyTable,
    years: BTreeMap<i32, YearSchedule>,
}

/// The complete rule set: one [`YearSchedule`] per supported tax year plus the
/// treaty table shared by all years.
#[derive(Debug, Clone)]
pub struct RuleBook {
    years: BTreeMap<i32, YearSchedule>,
    treaties: TreatyTable,
    digest: String,
}

/// Rules for a single tax year.
#[derive(Debug, Clone, Copy)]
pub struct TaxYearConfig<'a> {
    pub year: TaxYear,
    pub schedule: &'a YearSchedule,
    pub treaties: &'a TreatyTable,
}

impl RuleBook {
    /// Rules compiled into the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_RULES)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rules = Self::from_json(&json).inspect_err(|e| {
            log::warn!("Failed to load rules from {}: {}", path.display(), e);
        })?;
        log::debug!("Loaded rules from {} ({})", path.display(), rules.digest);
        Ok(rules)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawRuleBook = serde_json::from_str(json)?;
        for (year, schedule) in &raw.years {
            schedule.validate(*year)?;
        }
        raw.treaties.validate()?;

        let digest = hex::encode(Sha256::digest(json.as_bytes()));
        Ok(RuleBook {
            years: raw.years,
            treaties: raw.treaties,
            digest,
        })
    }

    /// Rules for `year`. Never falls back to another year.
    pub fn for_year(&self, year: TaxYear) -> Result<TaxYearConfig<'_>, ConfigError> {
        let schedule = self
            .years
            .get(&year.0)
            .ok_or(ConfigError::UnsupportedTaxYear(year.0))?;
        Ok(TaxYearConfig {
            year,
            schedule,
            treaties: &self.treaties,
        })
    }

    pub fn years(&self) -> impl Iterator<Item = TaxYear> + '_ {
        self.years.keys().map(|year| TaxYear(*year))
    }

    pub fn latest_year(&self) -> Option<TaxYear> {
        self.years().last()
    }

    pub fn treaties(&self) -> &TreatyTable {
        &self.treaties
    }

    /// SHA-256 of the source JSON, identifying the rule set in reports.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}
