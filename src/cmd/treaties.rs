//! Treaties command - print the treaty table

use crate::cmd::RulesArgs;
use clap::Args;
use nrtax::money::{format_rate, format_usd};
use nrtax::rules::{ExemptionMode, TreatyEntry};
use nrtax::TaxYear;
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct TreatiesCommand {
    /// Tax year whose statutory rate is shown where a treaty has none (defaults to latest)
    #[arg(short, long)]
    year: Option<i32>,

    #[command(flatten)]
    rules: RulesArgs,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Tabled)]
struct TreatyRow {
    #[tabled(rename = "Country")]
    country: String,
    #[tabled(rename = "Wage Exemption")]
    wage_exemption: String,
    #[tabled(rename = "Article")]
    article: String,
    #[tabled(rename = "Scholarships")]
    scholarships: String,
    #[tabled(rename = "Std. Deduction")]
    standard_deduction: String,
    #[tabled(rename = "Dividends")]
    dividends: String,
    #[tabled(rename = "Interest")]
    interest: String,
    #[tabled(rename = "Capital Gains")]
    capital_gains: String,
    #[tabled(rename = "Visas")]
    visas: String,
}

impl TreatiesCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let rules = self.rules.load()?;
        let treaties = rules.treaties();

        if self.json {
            println!("{}", serde_json::to_string_pretty(treaties)?);
            return Ok(());
        }

        let year = match self.year {
            Some(year) => TaxYear(year),
            None => rules
                .latest_year()
                .ok_or_else(|| anyhow::anyhow!("rules define no tax years"))?,
        };
        let statutory = rules.for_year(year)?.schedule.statutory_nec_rate;

        let rows: Vec<TreatyRow> = treaties
            .iter()
            .map(|(country, entry)| treaty_row(country, entry, statutory))
            .collect();

        println!();
        println!("TAX TREATIES (table {}, {} rates)", treaties.version(), year);
        println!();
        if rows.is_empty() {
            println!("No treaties configured");
            return Ok(());
        }
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        Ok(())
    }
}

fn treaty_row(country: &str, entry: &TreatyEntry, statutory: Decimal) -> TreatyRow {
    let rate = |rate: Option<Decimal>| format_rate(rate.unwrap_or(statutory));
    let wage_exemption = match (entry.wage_exemption, entry.wage_exemption_mode) {
        (None, _) => "-".to_string(),
        (Some(ceiling), ExemptionMode::Cap) => format_usd(ceiling),
        (Some(ceiling), ExemptionMode::Threshold) => format!("{} (threshold)", format_usd(ceiling)),
    };
    let wage_exemption = match entry.max_years {
        Some(years) if entry.wage_exemption.is_some() => format!("{wage_exemption}, {years} yrs"),
        _ => wage_exemption,
    };
    let article_or = |enabled: bool, article: &Option<String>| match (enabled, article) {
        (false, _) => "-".to_string(),
        (true, Some(article)) => format!("Art. {article}"),
        (true, None) => "yes".to_string(),
    };

    TreatyRow {
        country: country.to_string(),
        wage_exemption,
        article: entry
            .wage_exemption_article
            .as_ref()
            .map_or("-".to_string(), |a| format!("Art. {a}")),
        scholarships: article_or(entry.scholarship_exempt, &entry.scholarship_article),
        standard_deduction: article_or(
            entry.standard_deduction,
            &entry.standard_deduction_article,
        ),
        dividends: rate(entry.dividend_rate),
        interest: rate(entry.interest_rate),
        capital_gains: rate(entry.capital_gains_rate),
        visas: entry
            .eligible_visas
            .iter()
            .map(|v| v.display())
            .collect::<Vec<_>>()
            .join(", "),
    }
}
