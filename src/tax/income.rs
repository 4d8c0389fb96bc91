use crate::money::non_negative;
use crate::profile::{FilingStatus, TaxpayerProfile};
use crate::rules::YearSchedule;
use crate::tax::treaty::TreatyBenefit;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeductionKind {
    Standard,
    Itemized,
}

/// Effectively connected income and the deduction taken against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomeSummary {
    pub gross_wages: Decimal,
    pub exempt_wages: Decimal,
    pub taxable_wages: Decimal,
    pub grant_income: Decimal,
    pub taxable_grants: Decimal,
    pub deduction_kind: DeductionKind,
    pub deduction: Decimal,
    pub taxable_income: Decimal,
}

/// Combine wages and grants, less treaty exemptions and the better of the
/// treaty standard deduction or itemized charitable gifts.
pub fn aggregate(
    profile: &TaxpayerProfile,
    filing_status: FilingStatus,
    treaty: &TreatyBenefit,
    schedule: &YearSchedule,
) -> IncomeSummary {
    let taxable_wages = non_negative(profile.wages - treaty.exempt_wages);
    let grant_income = profile.grant_income();
    let taxable_grants = non_negative(grant_income - treaty.scholarship_exclusion);

    let itemized = profile.charitable_contributions;
    let standard = if treaty.standard_deduction_allowed {
        schedule.standard_deduction(filing_status)
    } else {
        Decimal::ZERO
    };
    let (deduction_kind, deduction) = if standard > Decimal::ZERO && standard >= itemized {
        (DeductionKind::Standard, standard)
    } else {
        (DeductionKind::Itemized, itemized)
    };

    let taxable_income = non_negative(taxable_wages + taxable_grants - deduction);
    log::debug!(
        "Income: wages={} exempt={} grants={} deduction={} ({:?}) taxable={}",
        profile.wages,
        treaty.exempt_wages,
        taxable_grants,
        deduction,
        deduction_kind,
        taxable_income
    );

    IncomeSummary {
        gross_wages: profile.wages,
        exempt_wages: treaty.exempt_wages,
        taxable_wages,
        grant_income,
        taxable_grants,
        deduction_kind,
        deduction,
        taxable_income,
    }
}
