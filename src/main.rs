mod cmd;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "nrtax",
    version,
    about = "US nonresident alien tax estimates (Form 1040-NR and Schedule NEC)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate tax, refund or amount owed for a taxpayer profile
    Calculate(cmd::calculate::CalculateCommand),
    /// Check a taxpayer profile for problems without calculating
    Validate(cmd::validate::ValidateCommand),
    /// Print the profile or result format
    Schema(cmd::schema::SchemaCommand),
    /// Print the tax treaty table
    Treaties(cmd::treaties::TreatiesCommand),
    /// Print the bracket schedule for a tax year
    Brackets(cmd::brackets::BracketsCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Calculate(cmd) => cmd.exec(),
        Command::Validate(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
        Command::Treaties(cmd) => cmd.exec(),
        Command::Brackets(cmd) => cmd.exec(),
    }
}
