//! The computation pipeline.

pub mod income;
pub mod nec;
pub mod reconcile;
pub mod residency;
pub mod result;
pub mod treaty;
pub mod wage;
pub mod warnings;

pub use income::DeductionKind;
pub use nec::{NecBreakdown, NecCategory, NecLine};
pub use residency::ResidencyDetermination;
pub use result::TaxComputationResult;
pub use treaty::TreatyBenefit;
pub use wage::BracketSlice;
pub use warnings::{Diagnostic, Severity, Warning};

use crate::money::round_cents;
use crate::profile::{FilingStatus, TaxpayerProfile};
use crate::rules::TaxYearConfig;
use reconcile::Findings;

/// Nonresidents cannot file jointly; joint filers are taxed as married
/// filing separately.
pub fn effective_filing_status(filing_status: FilingStatus) -> FilingStatus {
    match filing_status {
        FilingStatus::MarriedJoint => FilingStatus::MarriedSeparate,
        other => other,
    }
}

/// Run the full pipeline for one validated profile. Pure and deterministic.
pub fn compute(profile: &TaxpayerProfile, config: TaxYearConfig<'_>) -> TaxComputationResult {
    let schedule = config.schedule;
    let filing_status = effective_filing_status(profile.filing_status);

    let residency = residency::classify(profile, schedule);
    let treaty = treaty::resolve(profile, config);
    let income = income::aggregate(profile, filing_status, &treaty, schedule);
    let wage = wage::bracket_tax(income.taxable_income, schedule.brackets(filing_status));
    let nec = nec::calculate(profile, &treaty, schedule);
    let reconciliation = reconcile::reconcile(
        wage.tax,
        nec.total,
        round_cents(profile.federal_tax_withheld),
    );
    let warnings = reconcile::diagnose(&Findings {
        profile,
        schedule,
        residency: &residency,
        treaty: &treaty,
        income: &income,
        nec: &nec,
    });

    log::info!(
        "{} {} {}: total tax {} withheld {} refund {} owe {} ({} warnings)",
        config.year,
        profile.visa_type,
        filing_status,
        reconciliation.total_tax,
        reconciliation.total_withheld,
        reconciliation.refund,
        reconciliation.owe,
        warnings.len()
    );

    result::compose(result::Parts {
        tax_year: config.year,
        filing_status,
        residency,
        treaty,
        income,
        wage,
        nec,
        reconciliation,
        warnings,
        fica_withheld: profile.fica_withheld(),
        state_tax_withheld: profile.state_tax_withheld,
    })
}
