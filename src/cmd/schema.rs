//! Schema command - print the request and result formats

use clap::Args;
use nrtax::{ProfileInput, TaxComputationResult};
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the taxpayer profile
    JsonSchema,
    /// JSON Schema for the computation result
    ResultSchema,
    /// Profile field descriptions
    Fields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => {
                let schema = schema_for!(ProfileInput);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::ResultSchema => {
                let schema = schema_for!(TaxComputationResult);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::Fields => print_fields(),
        }
        Ok(())
    }
}

fn print_fields() {
    println!("Taxpayer Profile (JSON)");
    println!("=======================");
    println!();
    for field in ProfileInput::input_schema() {
        let req = if field.required { "required" } else { "optional" };
        println!("{:30} ({:8})  {}", field.name, req, field.description);
    }
    println!();
    println!("Amounts are US dollars and default to 0 when absent.");
}
