use crate::money::{non_negative, round_cents};
use crate::profile::TaxpayerProfile;
use crate::rules::YearSchedule;
use crate::tax::treaty::TreatyBenefit;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NecCategory {
    Dividends,
    Interest,
    CapitalGains,
}

impl NecCategory {
    pub fn display(&self) -> &'static str {
        match self {
            NecCategory::Dividends => "Dividends",
            NecCategory::Interest => "Interest",
            NecCategory::CapitalGains => "Capital gains",
        }
    }
}

/// One Schedule NEC line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct NecLine {
    pub category: NecCategory,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub gross: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub rate: Decimal,
    pub taxed: bool,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct NecBreakdown {
    pub lines: Vec<NecLine>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub total: Decimal,
}

impl NecBreakdown {
    pub fn line(&self, category: NecCategory) -> Option<&NecLine> {
        self.lines.iter().find(|line| line.category == category)
    }
}

fn line(category: NecCategory, gross: Decimal, rate: Decimal, taxed: bool) -> NecLine {
    let tax = if taxed {
        round_cents(gross * rate)
    } else {
        Decimal::ZERO
    };
    NecLine {
        category,
        gross,
        rate,
        taxed,
        tax,
    }
}

/// Flat tax on income not effectively connected with a US trade or business.
/// Capital gains are only taxed after enough days in the US this year.
pub fn calculate(
    profile: &TaxpayerProfile,
    treaty: &TreatyBenefit,
    schedule: &YearSchedule,
) -> NecBreakdown {
    let net_gains = non_negative(profile.capital_gains - profile.capital_losses);
    let gains_taxed = profile.days_present.current >= schedule.capital_gains_presence_days;

    let lines = vec![
        line(
            NecCategory::Dividends,
            profile.dividend_income,
            treaty.dividend_rate,
            true,
        ),
        line(
            NecCategory::Interest,
            profile.interest_income,
            treaty.interest_rate,
            true,
        ),
        line(
            NecCategory::CapitalGains,
            net_gains,
            treaty.capital_gains_rate,
            gains_taxed,
        ),
    ];
    let total = lines.iter().map(|line| line.tax).sum();
    log::debug!(
        "NEC: dividends={} interest={} gains={} (taxed={}) total={}",
        profile.dividend_income,
        profile.interest_income,
        net_gains,
        gains_taxed,
        total
    );

    NecBreakdown { lines, total }
}
