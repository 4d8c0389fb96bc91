use crate::money::non_negative;
use crate::profile::{FilingStatus, TaxpayerProfile};
use crate::rules::YearSchedule;
use crate::tax::income::{DeductionKind, IncomeSummary};
use crate::tax::nec::{NecBreakdown, NecCategory};
use crate::tax::residency::ResidencyDetermination;
use crate::tax::treaty::TreatyBenefit;
use crate::tax::warnings::Warning;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub total_tax: Decimal,
    pub total_withheld: Decimal,
    pub refund: Decimal,
    pub owe: Decimal,
}

/// Compare total liability with federal withholding. State and FICA
/// withholding never offset federal tax.
pub fn reconcile(wage_tax: Decimal, nec_tax: Decimal, federal_withheld: Decimal) -> Reconciliation {
    let total_tax = wage_tax + nec_tax;
    Reconciliation {
        total_tax,
        total_withheld: federal_withheld,
        refund: non_negative(federal_withheld - total_tax),
        owe: non_negative(total_tax - federal_withheld),
    }
}

/// Everything the diagnostics look at.
pub struct Findings<'a> {
    pub profile: &'a TaxpayerProfile,
    pub schedule: &'a YearSchedule,
    pub residency: &'a ResidencyDetermination,
    pub treaty: &'a TreatyBenefit,
    pub income: &'a IncomeSummary,
    pub nec: &'a NecBreakdown,
}

/// Warnings in a fixed order, independent of which ones fire.
pub fn diagnose(findings: &Findings<'_>) -> Vec<Warning> {
    let Findings {
        profile,
        schedule,
        residency,
        treaty,
        income,
        nec,
    } = findings;
    let mut warnings = Vec::new();
    let fica = profile.fica_withheld();
    let country = treaty.country.clone().unwrap_or_default();

    if profile.visa_type.is_student_category() && fica > Decimal::ZERO {
        warnings.push(Warning::FicaWithheldInError {
            visa_type: profile.visa_type,
            amount: fica,
        });
    }
    if treaty.exempt_wages > Decimal::ZERO {
        warnings.push(Warning::TreatyExemptionApplied {
            country: country.clone(),
            article: treaty.wage_exemption_article.clone(),
            amount: treaty.exempt_wages,
        });
    }
    if treaty.claims_benefit() && !treaty.documentation_filed {
        warnings.push(Warning::MissingTreatyDocumentation {
            country: country.clone(),
        });
    }
    match income.deduction_kind {
        DeductionKind::Standard => warnings.push(Warning::StandardDeductionApplied {
            article: treaty.standard_deduction_article.clone(),
            amount: income.deduction,
        }),
        DeductionKind::Itemized if income.deduction > Decimal::ZERO => {
            warnings.push(Warning::ItemizedDeductionsClaimed {
                amount: income.deduction,
            })
        }
        DeductionKind::Itemized => {}
    }
    let investment_income = [
        profile.dividend_income,
        profile.interest_income,
        profile.capital_gains,
    ];
    if !treaty.has_treaty() && investment_income.iter().any(|amount| *amount > Decimal::ZERO) {
        warnings.push(Warning::NoTreatyStatutoryRate {
            country: profile.country_of_residence.clone(),
            rate: schedule.statutory_nec_rate,
        });
    }
    if let Some(gains) = nec.line(NecCategory::CapitalGains) {
        if !gains.taxed && gains.gross > Decimal::ZERO {
            warnings.push(Warning::CapitalGainsNotTaxed {
                amount: gains.gross,
                days_present: profile.days_present.current,
                required_days: schedule.capital_gains_presence_days,
            });
        }
    }
    if nec.total > Decimal::ZERO {
        warnings.push(Warning::NecTaxDue { amount: nec.total });
    }
    if !residency.is_nonresident_alien {
        warnings.push(Warning::ResidentAlien {
            weighted_days: residency.weighted_days,
        });
        if fica == Decimal::ZERO && profile.wages > Decimal::ZERO {
            warnings.push(Warning::ResidentAlienNoFica);
        }
    }
    if let Some(state) = &profile.state {
        if schedule.has_no_income_tax(state) && profile.state_tax_withheld > Decimal::ZERO {
            warnings.push(Warning::StateHasNoIncomeTax {
                state: state.clone(),
                withheld: profile.state_tax_withheld,
            });
        }
        if schedule.is_high_tax(state)
            && profile.state_tax_withheld == Decimal::ZERO
            && profile.wages > Decimal::ZERO
        {
            warnings.push(Warning::HighTaxStateNoWithholding {
                state: state.clone(),
            });
        }
    }
    if profile.filing_status == FilingStatus::MarriedJoint {
        warnings.push(Warning::JointFilingNotPermitted);
    }
    if profile.visa_type.is_student_category() && profile.entry_date.is_none() {
        warnings.push(Warning::MissingEntryDate {
            visa_type: profile.visa_type,
        });
    }

    warnings
}
