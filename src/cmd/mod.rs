pub mod brackets;
pub mod calculate;
pub mod schema;
pub mod treaties;
pub mod validate;

use anyhow::Context;
use clap::Args;
use nrtax::profile::{read_profile_json, ProfileInput};
use nrtax::RuleBook;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Read a taxpayer profile (JSON) from a file, or stdin with "-"
pub fn read_profile(path: &Path) -> anyhow::Result<ProfileInput> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        read_from_file(path)
    }
}

fn read_from_file(path: &Path) -> anyhow::Result<ProfileInput> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let profile = read_profile_json(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(profile)
}

fn read_from_stdin() -> anyhow::Result<ProfileInput> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a profile file or pipe JSON to stdin.");
    }

    let profile = read_profile_json(io::Cursor::new(buffer)).context("parsing profile from stdin")?;
    Ok(profile)
}

/// Where to load tax rules from
#[derive(Args, Debug, Clone)]
pub struct RulesArgs {
    /// Rules file (JSON) replacing the built-in brackets and treaty table
    #[arg(long)]
    rules: Option<PathBuf>,
}

impl RulesArgs {
    pub fn load(&self) -> anyhow::Result<RuleBook> {
        let rules = match &self.rules {
            Some(path) => RuleBook::from_path(path)?,
            None => RuleBook::builtin()?,
        };
        log::debug!("Using rules {}", rules.digest());
        Ok(rules)
    }
}
