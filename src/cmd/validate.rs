//! Validate command - check a profile without computing

use crate::cmd::{read_profile, RulesArgs};
use clap::Args;
use nrtax::TaxYear;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Taxpayer profile (JSON). Reads from stdin if not specified.
    #[arg(short, long, default_value = "-")]
    profile: PathBuf,

    #[command(flatten)]
    rules: RulesArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ValidationOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    tax_year: Option<i32>,
    issue_count: usize,
    issues: Vec<String>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let rules = self.rules.load()?;
        let input = read_profile(&self.profile)?;

        let mut issues: Vec<String> = match input.to_profile() {
            Ok(_) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        };
        if let Some(year) = input.tax_year {
            if let Err(e) = rules.for_year(TaxYear(year)) {
                issues.push(e.to_string());
            }
        }

        let output = ValidationOutput {
            tax_year: input.tax_year,
            issue_count: issues.len(),
            issues,
        };
        if self.json {
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_text(&output);
        }

        // Exit with code 1 if issues found
        if output.issue_count > 0 {
            std::process::exit(1);
        }
        Ok(())
    }
}

fn print_text(output: &ValidationOutput) {
    let year_str = output
        .tax_year
        .map_or("unknown year".to_string(), |y| y.to_string());

    println!();
    println!("VALIDATION RESULTS ({})", year_str);
    println!();

    if output.issues.is_empty() {
        println!("\u{2713} No issues found.");
    } else {
        println!("\u{26A0} {} issue(s) found:", output.issue_count);
        println!();
        for (i, issue) in output.issues.iter().enumerate() {
            println!("  {}. {}", i + 1, issue);
        }
    }
    println!();
}
