use crate::profile::{TaxpayerProfile, VisaType};
use crate::rules::YearSchedule;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;

/// Outcome of the substantial presence test for the tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ResidencyDetermination {
    pub is_nonresident_alien: bool,
    /// F-1/J-1 holder inside the exempt period, whose days do not count.
    pub exempt_individual: bool,
    /// `current + prior/3 + two_prior/6`, to two decimal places.
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub weighted_days: Decimal,
    /// Calendar years of the exempt period used so far.
    pub exempt_years: u32,
    /// Calendar years since first entry, counting the entry year.
    pub years_in_us: Option<u32>,
    pub note: String,
}

/// Weighted presence in sixths of a day, so the threshold compares exactly.
pub fn weighted_sixths(current: u16, prior: u16, two_prior: u16) -> u32 {
    6 * u32::from(current) + 2 * u32::from(prior) + u32::from(two_prior)
}

fn reaches_threshold(sixths: u32, schedule: &YearSchedule) -> bool {
    sixths >= 6 * u32::from(schedule.spt_threshold_days)
}

/// The substantial presence test on weighted presence in sixths of a day.
pub fn is_substantially_present(sixths: u32, current_days: u16, schedule: &YearSchedule) -> bool {
    current_days >= schedule.spt_min_current_year_days && reaches_threshold(sixths, schedule)
}

/// Calendar years a visa holder may exclude from the count.
pub fn exempt_period(profile: &TaxpayerProfile, schedule: &YearSchedule) -> u32 {
    match profile.visa_type {
        VisaType::F1 => schedule.student_exempt_years,
        VisaType::J1 if profile.is_student => schedule.student_exempt_years,
        VisaType::J1 => schedule.teacher_trainee_exempt_years,
        VisaType::H1B | VisaType::Other => 0,
    }
}

pub fn classify(profile: &TaxpayerProfile, schedule: &YearSchedule) -> ResidencyDetermination {
    let days = profile.days_present;
    let sixths = weighted_sixths(days.current, days.prior, days.two_prior);
    let weighted_days = (Decimal::from(sixths) / Decimal::from(6)).round_dp(2);

    let years_in_us = profile.calendar_years_in_us();
    let period = exempt_period(profile, schedule);
    let exempt_individual = matches!(years_in_us, Some(years) if period > 0 && years <= period);
    let exempt_years = years_in_us.map_or(0, |years| years.min(period));

    let present = is_substantially_present(sixths, days.current, schedule);

    let (is_nonresident_alien, note) = if exempt_individual {
        (
            true,
            format!(
                "Exempt individual: year {} of {} on a {} visa, days present do not count \
                 toward the substantial presence test.",
                years_in_us.unwrap_or_default(),
                period,
                profile.visa_type
            ),
        )
    } else if present {
        (
            false,
            format!(
                "Substantial presence test met: {} weighted days (threshold {}).",
                weighted_days, schedule.spt_threshold_days
            ),
        )
    } else if reaches_threshold(sixths, schedule) {
        (
            true,
            format!(
                "Substantial presence test not met: only {} days present in {} (minimum {}).",
                days.current, profile.tax_year, schedule.spt_min_current_year_days
            ),
        )
    } else {
        (
            true,
            format!(
                "Substantial presence test not met: {} weighted days (threshold {}).",
                weighted_days, schedule.spt_threshold_days
            ),
        )
    };

    if !is_nonresident_alien {
        log::warn!(
            "Resident alien for {}: {} weighted days",
            profile.tax_year,
            weighted_days
        );
    }
    log::debug!(
        "Residency: nonresident={} exempt={} weighted_days={} years_in_us={:?}",
        is_nonresident_alien,
        exempt_individual,
        weighted_days,
        years_in_us
    );

    ResidencyDetermination {
        is_nonresident_alien,
        exempt_individual,
        weighted_days,
        exempt_years,
        years_in_us,
        note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::PresenceDays;
    use crate::rules::{RuleBook, TaxYear};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn schedule() -> YearSchedule {
        let rules = RuleBook::builtin().unwrap();
        rules.for_year(TaxYear(2025)).unwrap().schedule.clone()
    }

    fn profile(
        visa_type: VisaType,
        entry: Option<(i32, u32, u32)>,
        days: (u16, u16, u16),
    ) -> TaxpayerProfile {
        let mut profile = TaxpayerProfile::new(TaxYear(2025), visa_type);
        profile.entry_date = entry.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        profile.days_present = PresenceDays {
            current: days.0,
            prior: days.1,
            two_prior: days.2,
        };
        profile
    }

    #[test]
    fn weighted_days_formula() {
        assert_eq!(weighted_sixths(120, 150, 10), 6 * 120 + 2 * 150 + 10);
        let r = classify(&profile(VisaType::H1B, None, (120, 150, 120)), &schedule());
        // 120 + 50 + 20
        assert_eq!(r.weighted_days, dec!(190));
        assert!(!r.is_nonresident_alien);
    }

    #[test]
    fn exactly_183_weighted_days_is_resident() {
        let r = classify(&profile(VisaType::H1B, None, (182, 3, 0)), &schedule());
        assert_eq!(r.weighted_days, dec!(183));
        assert!(!r.is_nonresident_alien);
    }

    #[test]
    fn just_under_183_is_nonresident() {
        // 182 + 2/3 + 1/6
        let r = classify(&profile(VisaType::H1B, None, (182, 2, 1)), &schedule());
        assert_eq!(r.weighted_days, dec!(182.83));
        assert!(r.is_nonresident_alien);
    }

    #[test]
    fn one_sixth_short_of_threshold_is_nonresident() {
        let s = schedule();
        // 182 + 2/3 + 1/6 + 1/6: exactly 183
        assert!(is_substantially_present(weighted_sixths(182, 2, 2), 182, &s));
        // 182 + 2/3 + 1/6: one sixth short, rounds to 182.83
        assert!(!is_substantially_present(weighted_sixths(182, 2, 1), 182, &s));
        // 182 + 1/3 + 3/6: one sixth short again
        let r = classify(&profile(VisaType::H1B, None, (182, 1, 3)), &s);
        assert!(r.is_nonresident_alien);
        assert_eq!(r.weighted_days, dec!(182.83));
        assert!(!is_substantially_present(weighted_sixths(200, 0, 0), 30, &s));
    }

    #[test]
    fn fewer_than_31_current_days_is_nonresident() {
        let r = classify(&profile(VisaType::H1B, None, (30, 365, 365)), &schedule());
        assert!(r.is_nonresident_alien);
        assert!(r.note.contains("minimum 31"));
    }

    #[test]
    fn f1_student_in_fifth_year_is_exempt() {
        let r = classify(
            &profile(VisaType::F1, Some((2021, 8, 15)), (365, 365, 365)),
            &schedule(),
        );
        assert!(r.exempt_individual);
        assert!(r.is_nonresident_alien);
        assert_eq!(r.years_in_us, Some(5));
        assert_eq!(r.exempt_years, 5);
    }

    #[test]
    fn f1_student_in_sixth_year_counts_days() {
        let r = classify(
            &profile(VisaType::F1, Some((2020, 8, 15)), (365, 365, 365)),
            &schedule(),
        );
        assert!(!r.exempt_individual);
        assert!(!r.is_nonresident_alien);
        assert_eq!(r.exempt_years, 5);
    }

    #[test]
    fn j1_researcher_exempt_for_two_years() {
        let mut p = profile(VisaType::J1, Some((2024, 1, 10)), (365, 300, 0));
        p.is_student = false;
        assert!(classify(&p, &schedule()).exempt_individual);

        p.entry_date = NaiveDate::from_ymd_opt(2023, 1, 10);
        let r = classify(&p, &schedule());
        assert!(!r.exempt_individual);
        assert!(!r.is_nonresident_alien);
    }

    #[test]
    fn missing_entry_date_is_not_exempt() {
        let r = classify(&profile(VisaType::F1, None, (300, 0, 0)), &schedule());
        assert!(!r.exempt_individual);
        assert!(!r.is_nonresident_alien);
        assert_eq!(r.years_in_us, None);
    }

    #[test]
    fn h1b_never_exempt() {
        let r = classify(
            &profile(VisaType::H1B, Some((2025, 3, 1)), (100, 0, 0)),
            &schedule(),
        );
        assert!(!r.exempt_individual);
        assert!(r.is_nonresident_alien);
        assert_eq!(r.exempt_years, 0);
    }
}
