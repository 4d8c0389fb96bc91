//! Calculate command - run the full estimate for one profile

use crate::cmd::{read_profile, RulesArgs};
use clap::Args;
use nrtax::money::{format_rate, format_usd};
use nrtax::tax::DeductionKind;
use nrtax::TaxComputationResult;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct CalculateCommand {
    /// Taxpayer profile (JSON). Reads from stdin if not specified.
    #[arg(short, long, default_value = "-")]
    profile: PathBuf,

    #[command(flatten)]
    rules: RulesArgs,

    /// Output the full result as JSON
    #[arg(long, conflicts_with = "csv")]
    json: bool,

    /// Output the summary lines as CSV
    #[arg(long)]
    csv: bool,
}

#[derive(Debug, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Line")]
    line: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    line: &'a str,
    amount: String,
}

#[derive(Debug, Tabled)]
struct NecRow {
    #[tabled(rename = "Income")]
    category: String,
    #[tabled(rename = "Gross")]
    gross: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Tax")]
    tax: String,
}

#[derive(Debug, Tabled)]
struct BracketRow {
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Income In Bracket")]
    amount: String,
    #[tabled(rename = "Tax")]
    tax: String,
}

impl CalculateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let rules = self.rules.load()?;
        let input = read_profile(&self.profile)?;
        let result = nrtax::calculate(&input, &rules)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else if self.csv {
            write_csv(&result)?;
        } else {
            print_report(&result);
        }
        Ok(())
    }
}

fn summary_lines(result: &TaxComputationResult) -> Vec<(&'static str, Decimal)> {
    let deduction = match result.deduction_kind {
        DeductionKind::Standard => "Standard deduction",
        DeductionKind::Itemized => "Itemized deductions",
    };
    vec![
        ("Treaty exemption", result.treaty_exemption),
        ("Taxable wages", result.taxable_wages),
        ("Taxable scholarships", result.taxable_grants),
        (deduction, result.itemized_deductions),
        ("Taxable income", result.taxable_income),
        ("Wage tax", result.wage_tax),
        ("NEC tax", result.nec_tax),
        ("Total tax", result.total_tax),
        ("Federal tax withheld", result.total_withheld),
        ("Refund", result.refund),
        ("Amount owed", result.owe),
    ]
}

fn write_csv(result: &TaxComputationResult) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(io::stdout());
    for (line, amount) in summary_lines(result) {
        wtr.serialize(CsvRow {
            line,
            amount: format!("{:.2}", amount),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

fn print_report(result: &TaxComputationResult) {
    println!();
    println!(
        "TAX ESTIMATE ({}, {}) - Form 1040-NR",
        result.tax_year, result.filing_status
    );
    println!();
    println!("  {}", result.residency.note);
    match &result.treaty.country {
        Some(country) => println!(
            "  Treaty: US-{} (table {})",
            country, result.treaty.table_version
        ),
        None => println!("  Treaty: none"),
    }
    println!();

    let rows: Vec<SummaryRow> = summary_lines(result)
        .into_iter()
        .map(|(line, amount)| SummaryRow {
            line: line.to_string(),
            amount: format_usd(amount),
        })
        .collect();
    println!("{}", styled(Table::new(rows)));

    if !result.wage_brackets.is_empty() {
        println!();
        println!("WAGE TAX BY BRACKET");
        let rows: Vec<BracketRow> = result
            .wage_brackets
            .iter()
            .map(|slice| BracketRow {
                rate: format_rate(slice.rate),
                amount: format_usd(slice.amount),
                tax: format_usd(slice.tax),
            })
            .collect();
        println!("{}", styled(Table::new(rows)));
    }

    let nec_rows: Vec<NecRow> = result
        .nec
        .lines
        .iter()
        .filter(|line| line.gross > Decimal::ZERO)
        .map(|line| NecRow {
            category: line.category.display().to_string(),
            gross: format_usd(line.gross),
            rate: if line.taxed {
                format_rate(line.rate)
            } else {
                "not taxed".to_string()
            },
            tax: format_usd(line.tax),
        })
        .collect();
    if !nec_rows.is_empty() {
        println!();
        println!("SCHEDULE NEC");
        println!("{}", styled(Table::new(nec_rows)));
    }

    println!();
    if result.warnings.is_empty() {
        println!("\u{2713} No warnings.");
    } else {
        println!("\u{26A0} {} warning(s):", result.warnings.len());
        println!();
        for (i, warning) in result.warnings.iter().enumerate() {
            println!("  {}. [{}] {}", i + 1, warning.severity, warning.code);
            println!("     {}", warning.message);
        }
    }
    println!();
}

fn styled(mut table: Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string()
}
