use crate::money::round_cents;
use crate::profile::FilingStatus;
use crate::rules::TaxYear;
use crate::tax::income::{DeductionKind, IncomeSummary};
use crate::tax::nec::NecBreakdown;
use crate::tax::reconcile::Reconciliation;
use crate::tax::residency::ResidencyDetermination;
use crate::tax::treaty::TreatyBenefit;
use crate::tax::wage::{BracketSlice, WageTax};
use crate::tax::warnings::{Diagnostic, Warning};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;

/// Estimated Form 1040-NR liability. Every monetary field is rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TaxComputationResult {
    pub tax_year: TaxYear,
    /// Filing status the brackets were taken from.
    pub filing_status: FilingStatus,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub taxable_wages: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub treaty_exemption: Decimal,
    /// The deduction taken, standard or itemized (see `deduction_kind`).
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub itemized_deductions: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub taxable_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub wage_tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub nec_tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub total_tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub refund: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub owe: Decimal,
    pub warnings: Vec<Diagnostic>,
    pub deduction_kind: DeductionKind,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub taxable_grants: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub total_withheld: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub fica_withheld: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub state_tax_withheld: Decimal,
    pub residency: ResidencyDetermination,
    pub treaty: TreatyBenefit,
    pub nec: NecBreakdown,
    pub wage_brackets: Vec<BracketSlice>,
}

impl TaxComputationResult {
    pub fn has_critical(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.severity == crate::tax::Severity::Critical)
    }
}

/// Parts produced by the earlier pipeline stages.
pub struct Parts {
    pub tax_year: TaxYear,
    pub filing_status: FilingStatus,
    pub residency: ResidencyDetermination,
    pub treaty: TreatyBenefit,
    pub income: IncomeSummary,
    pub wage: WageTax,
    pub nec: NecBreakdown,
    pub reconciliation: Reconciliation,
    pub warnings: Vec<Warning>,
    pub fica_withheld: Decimal,
    pub state_tax_withheld: Decimal,
}

pub fn compose(parts: Parts) -> TaxComputationResult {
    let Parts {
        tax_year,
        filing_status,
        residency,
        treaty,
        income,
        wage,
        nec,
        reconciliation,
        warnings,
        fica_withheld,
        state_tax_withheld,
    } = parts;

    TaxComputationResult {
        tax_year,
        filing_status,
        taxable_wages: round_cents(income.taxable_wages),
        treaty_exemption: round_cents(income.exempt_wages),
        itemized_deductions: round_cents(income.deduction),
        taxable_income: round_cents(income.taxable_income),
        wage_tax: round_cents(wage.tax),
        nec_tax: round_cents(nec.total),
        total_tax: round_cents(reconciliation.total_tax),
        refund: round_cents(reconciliation.refund),
        owe: round_cents(reconciliation.owe),
        warnings: warnings.iter().map(Warning::to_diagnostic).collect(),
        deduction_kind: income.deduction_kind,
        taxable_grants: round_cents(income.taxable_grants),
        total_withheld: round_cents(reconciliation.total_withheld),
        fica_withheld: round_cents(fica_withheld),
        state_tax_withheld: round_cents(state_tax_withheld),
        residency,
        treaty,
        nec,
        wage_brackets: wage.slices,
    }
}
