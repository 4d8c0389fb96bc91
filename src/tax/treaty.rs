use crate::money::non_negative;
use crate::profile::TaxpayerProfile;
use crate::rules::{ExemptionMode, TaxYearConfig, TreatyEntry};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;

/// Treaty benefits resolved for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TreatyBenefit {
    /// Canonical treaty country, `None` when there is no treaty.
    pub country: Option<String>,
    /// Wages exempt under the student/trainee article.
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub exempt_wages: Decimal,
    pub wage_exemption_article: Option<String>,
    /// Scholarship and fellowship income exempt under the treaty.
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub scholarship_exclusion: Decimal,
    pub scholarship_article: Option<String>,
    pub standard_deduction_allowed: bool,
    pub standard_deduction_article: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub dividend_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub interest_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub capital_gains_rate: Decimal,
    /// A reduced treaty rate applies to investment income actually received.
    pub reduced_rate_claimed: bool,
    /// Form 8233 or treaty statement assumed on file.
    pub documentation_filed: bool,
    pub table_version: String,
}

impl TreatyBenefit {
    pub fn has_treaty(&self) -> bool {
        self.country.is_some()
    }

    /// Whether any exemption, deduction or reduced rate is being claimed under the treaty.
    pub fn claims_benefit(&self) -> bool {
        self.exempt_wages > Decimal::ZERO
            || self.scholarship_exclusion > Decimal::ZERO
            || self.standard_deduction_allowed
            || self.reduced_rate_claimed
    }
}

/// Wages exempt under `entry`, after any ceiling already used elsewhere.
fn exempt_wages(entry: &TreatyEntry, profile: &TaxpayerProfile) -> Decimal {
    let Some(ceiling) = entry.wage_exemption else {
        return Decimal::ZERO;
    };
    if !entry.covers(profile.visa_type) {
        return Decimal::ZERO;
    }
    if let (Some(max_years), Some(years)) = (entry.max_years, profile.calendar_years_in_us()) {
        if years > max_years {
            return Decimal::ZERO;
        }
    }
    let remaining = non_negative(ceiling - profile.treaty_exemption_claimed);
    match entry.wage_exemption_mode {
        ExemptionMode::Cap => profile.wages.min(remaining),
        ExemptionMode::Threshold if profile.wages > ceiling => Decimal::ZERO,
        ExemptionMode::Threshold => profile.wages.min(remaining),
    }
}

pub fn resolve(profile: &TaxpayerProfile, config: TaxYearConfig<'_>) -> TreatyBenefit {
    let statutory = config.schedule.statutory_nec_rate;
    let table_version = config.treaties.version().to_string();

    let Some((country, entry)) = config.treaties.lookup(&profile.country_of_residence) else {
        log::debug!(
            "No treaty for '{}', statutory rate {}",
            profile.country_of_residence,
            statutory
        );
        return TreatyBenefit {
            country: None,
            exempt_wages: Decimal::ZERO,
            wage_exemption_article: None,
            scholarship_exclusion: Decimal::ZERO,
            scholarship_article: None,
            standard_deduction_allowed: false,
            standard_deduction_article: None,
            dividend_rate: statutory,
            interest_rate: statutory,
            capital_gains_rate: statutory,
            reduced_rate_claimed: false,
            documentation_filed: profile.treaty_documentation_filed,
            table_version,
        };
    };

    let exempt_wages = exempt_wages(entry, profile);
    let eligible = entry.covers(profile.visa_type);
    let scholarship_exclusion = if entry.scholarship_exempt && eligible {
        profile.grant_income()
    } else {
        Decimal::ZERO
    };
    let standard_deduction_allowed = entry.standard_deduction && eligible;
    let dividend_rate = entry.dividend_rate.unwrap_or(statutory);
    let interest_rate = entry.interest_rate.unwrap_or(statutory);
    let capital_gains_rate = entry.capital_gains_rate.unwrap_or(statutory);
    let reduced_rate_claimed = [
        (profile.dividend_income, dividend_rate),
        (profile.interest_income, interest_rate),
        (profile.capital_gains, capital_gains_rate),
    ]
    .iter()
    .any(|(income, rate)| *income > Decimal::ZERO && *rate < statutory);

    let benefit = TreatyBenefit {
        country: Some(country.to_string()),
        exempt_wages,
        wage_exemption_article: entry.wage_exemption_article.clone(),
        scholarship_exclusion,
        scholarship_article: entry.scholarship_article.clone(),
        standard_deduction_allowed,
        standard_deduction_article: entry.standard_deduction_article.clone(),
        dividend_rate,
        interest_rate,
        capital_gains_rate,
        reduced_rate_claimed,
        documentation_filed: profile.treaty_documentation_filed,
        table_version,
    };
    log::debug!(
        "Treaty {}: exempt_wages={} scholarship_exclusion={} standard_deduction={}",
        country,
        benefit.exempt_wages,
        benefit.scholarship_exclusion,
        benefit.standard_deduction_allowed
    );
    benefit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::VisaType;
    use crate::rules::{RuleBook, TaxYear};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn profile(country: &str, visa_type: VisaType, wages: Decimal) -> TaxpayerProfile {
        let mut profile = TaxpayerProfile::new(TaxYear(2025), visa_type);
        profile.country_of_residence = country.to_string();
        profile.wages = wages;
        profile
    }

    fn resolve_2025(profile: &TaxpayerProfile) -> TreatyBenefit {
        let rules = RuleBook::builtin().unwrap();
        resolve(profile, rules.for_year(TaxYear(2025)).unwrap())
    }

    #[test]
    fn no_treaty_uses_statutory_rates() {
        let benefit = resolve_2025(&profile("Brazil", VisaType::F1, dec!(20000)));
        assert!(!benefit.has_treaty());
        assert_eq!(benefit.exempt_wages, Decimal::ZERO);
        assert_eq!(benefit.dividend_rate, dec!(0.30));
        assert_eq!(benefit.interest_rate, dec!(0.30));
        assert_eq!(benefit.capital_gains_rate, dec!(0.30));
        assert_eq!(benefit.table_version, "2025.1");
    }

    #[test]
    fn china_exemption_capped_at_ceiling() {
        let benefit = resolve_2025(&profile("China", VisaType::F1, dec!(15000)));
        assert_eq!(benefit.country.as_deref(), Some("China"));
        assert_eq!(benefit.exempt_wages, dec!(5000));
        assert_eq!(benefit.wage_exemption_article.as_deref(), Some("20(c)"));
        assert_eq!(benefit.dividend_rate, dec!(0.10));
        assert_eq!(benefit.interest_rate, dec!(0.30));
    }

    #[test]
    fn exemption_never_exceeds_wages() {
        let benefit = resolve_2025(&profile("China", VisaType::F1, dec!(3000)));
        assert_eq!(benefit.exempt_wages, dec!(3000));
    }

    #[test]
    fn exemption_reduced_by_prior_claims() {
        let mut p = profile("China", VisaType::F1, dec!(15000));
        p.treaty_exemption_claimed = dec!(3500);
        assert_eq!(resolve_2025(&p).exempt_wages, dec!(1500));

        p.treaty_exemption_claimed = dec!(9000);
        assert_eq!(resolve_2025(&p).exempt_wages, Decimal::ZERO);
    }

    #[test]
    fn canada_threshold_lost_above_ceiling() {
        let under = resolve_2025(&profile("Canada", VisaType::F1, dec!(9000)));
        assert_eq!(under.exempt_wages, dec!(9000));
        let at = resolve_2025(&profile("Canada", VisaType::F1, dec!(10000)));
        assert_eq!(at.exempt_wages, dec!(10000));
        let over = resolve_2025(&profile("Canada", VisaType::F1, dec!(10000.01)));
        assert_eq!(over.exempt_wages, Decimal::ZERO);
        assert_eq!(over.dividend_rate, dec!(0.15));
    }

    #[test]
    fn h1b_gets_reduced_rates_but_no_student_article() {
        let benefit = resolve_2025(&profile("China", VisaType::H1B, dec!(80000)));
        assert_eq!(benefit.exempt_wages, Decimal::ZERO);
        assert_eq!(benefit.dividend_rate, dec!(0.10));
        assert!(!benefit.claims_benefit());
    }

    #[test]
    fn reduced_rate_on_received_income_is_a_claim() {
        let mut p = profile("China", VisaType::H1B, dec!(80000));
        p.interest_income = dec!(500);
        // China interest falls back to the statutory rate
        assert!(!resolve_2025(&p).claims_benefit());

        p.dividend_income = dec!(500);
        let benefit = resolve_2025(&p);
        assert!(benefit.reduced_rate_claimed);
        assert!(benefit.claims_benefit());
    }

    #[test]
    fn korea_article_expires_after_five_years() {
        let mut p = profile("Korea", VisaType::F1, dec!(10000));
        p.entry_date = NaiveDate::from_ymd_opt(2021, 8, 20);
        assert_eq!(resolve_2025(&p).exempt_wages, dec!(2000));
        p.entry_date = NaiveDate::from_ymd_opt(2020, 8, 20);
        assert_eq!(resolve_2025(&p).exempt_wages, Decimal::ZERO);
    }

    #[test]
    fn india_standard_deduction_for_students() {
        let benefit = resolve_2025(&profile("India", VisaType::F1, dec!(30000)));
        assert!(benefit.standard_deduction_allowed);
        assert_eq!(benefit.standard_deduction_article.as_deref(), Some("21(2)"));
        assert_eq!(benefit.exempt_wages, Decimal::ZERO);
        assert_eq!(benefit.dividend_rate, dec!(0.25));

        let h1b = resolve_2025(&profile("India", VisaType::H1B, dec!(30000)));
        assert!(!h1b.standard_deduction_allowed);
    }

    #[test]
    fn china_scholarship_excluded() {
        let mut p = profile("China", VisaType::F1, Decimal::ZERO);
        p.scholarship_grants = dec!(4000);
        p.fellowship_grants = dec!(1000);
        let benefit = resolve_2025(&p);
        assert_eq!(benefit.scholarship_exclusion, dec!(5000));
        assert_eq!(benefit.scholarship_article.as_deref(), Some("20(b)"));
    }
}
