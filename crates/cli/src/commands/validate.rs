//! Chain validation command.

use anyhow::{bail, Result};
use colored::Colorize;

use crate::context::DataDir;

pub fn run(data: &DataDir) -> Result<()> {
    let storage = data.open_storage()?;
    let ledger = data.open_ledger(&storage)?;

    let issues = ledger.validate();
    let checked = ledger.height() + 1;

    println!();
    if issues.is_empty() {
        println!(
            "{}  {} blocks checked, chain is consistent",
            "✓".green().bold(),
            checked.to_string().bright_cyan()
        );
        println!();
        return Ok(());
    }

    for issue in &issues {
        println!("  {} {}", "✗".red().bold(), issue);
    }
    println!();

    bail!("{} issue(s) found in {} blocks", issues.len(), checked)
}
