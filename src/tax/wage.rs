use crate::money::round_cents;
use crate::rules::Bracket;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;

/// The part of taxable income that falls in one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct BracketSlice {
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub from: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schemars(with = "Option<f64>")]
    pub to: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WageTax {
    pub tax: Decimal,
    pub slices: Vec<BracketSlice>,
}

/// Progressive tax on `taxable_income`: each bracket's rate applies only to
/// the income inside it. The total is rounded to cents once, after summing.
pub fn bracket_tax(taxable_income: Decimal, brackets: &[Bracket]) -> WageTax {
    let mut slices = Vec::new();
    let mut total = Decimal::ZERO;
    let mut lower = Decimal::ZERO;

    for bracket in brackets {
        if taxable_income <= lower {
            break;
        }
        let upper = match bracket.up_to {
            Some(up_to) => taxable_income.min(up_to),
            None => taxable_income,
        };
        let amount = upper - lower;
        let tax = amount * bracket.rate;
        total += tax;
        slices.push(BracketSlice {
            rate: bracket.rate,
            from: lower,
            to: bracket.up_to,
            amount,
            tax: round_cents(tax),
        });
        match bracket.up_to {
            Some(up_to) => lower = up_to,
            None => break,
        }
    }

    let tax = round_cents(total);
    log::debug!("Wage tax on {}: {}", taxable_income, tax);
    WageTax { tax, slices }
}
