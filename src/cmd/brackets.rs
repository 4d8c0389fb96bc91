//! Brackets command - print a year's rate schedule

use crate::cmd::RulesArgs;
use clap::{Args, ValueEnum};
use nrtax::money::{format_rate, format_usd};
use nrtax::{FilingStatus, TaxYear};
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct BracketsCommand {
    /// Tax year (defaults to the latest configured year)
    #[arg(short, long)]
    year: Option<i32>,

    /// Filing status
    #[arg(short, long, value_enum, default_value_t = FilingStatusArg::Single)]
    filing_status: FilingStatusArg,

    #[command(flatten)]
    rules: RulesArgs,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum FilingStatusArg {
    #[default]
    Single,
    MarriedSeparate,
    MarriedJoint,
}

impl From<FilingStatusArg> for FilingStatus {
    fn from(arg: FilingStatusArg) -> Self {
        match arg {
            FilingStatusArg::Single => FilingStatus::Single,
            FilingStatusArg::MarriedSeparate => FilingStatus::MarriedSeparate,
            FilingStatusArg::MarriedJoint => FilingStatus::MarriedJoint,
        }
    }
}

#[derive(Debug, Tabled)]
struct BracketRow {
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Over")]
    from: String,
    #[tabled(rename = "Up To")]
    to: String,
}

#[derive(Debug, Serialize)]
struct BracketsOutput {
    tax_year: TaxYear,
    filing_status: FilingStatus,
    #[serde(with = "rust_decimal::serde::float")]
    standard_deduction: Decimal,
    brackets: Vec<BracketJson>,
}

#[derive(Debug, Serialize)]
struct BracketJson {
    #[serde(with = "rust_decimal::serde::float_option")]
    up_to: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    rate: Decimal,
}

impl BracketsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let rules = self.rules.load()?;
        let year = match self.year {
            Some(year) => TaxYear(year),
            None => rules
                .latest_year()
                .ok_or_else(|| anyhow::anyhow!("rules define no tax years"))?,
        };
        let filing_status: FilingStatus = self.filing_status.into();
        let config = rules.for_year(year)?;
        let brackets = config.schedule.brackets(filing_status);
        let standard_deduction = config.schedule.standard_deduction(filing_status);

        if self.json {
            let output = BracketsOutput {
                tax_year: year,
                filing_status,
                standard_deduction,
                brackets: brackets
                    .iter()
                    .map(|b| BracketJson {
                        up_to: b.up_to,
                        rate: b.rate,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let mut lower = Decimal::ZERO;
        let rows: Vec<BracketRow> = brackets
            .iter()
            .map(|b| {
                let row = BracketRow {
                    rate: format_rate(b.rate),
                    from: format_usd(lower),
                    to: b.up_to.map_or("-".to_string(), format_usd),
                };
                if let Some(up_to) = b.up_to {
                    lower = up_to;
                }
                row
            })
            .collect();

        println!();
        println!("TAX BRACKETS ({}, {})", year, filing_status);
        println!();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!();
        println!(
            "Treaty standard deduction: {}",
            format_usd(standard_deduction)
        );
        println!();
        Ok(())
    }
}
