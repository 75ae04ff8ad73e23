//! Initialize chain command.

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use starchain_chain::{Ledger, LedgerConfig};
use starchain_core::{Ed25519Verifier, SystemClock, CHALLENGE_WINDOW_SECS};
use std::sync::Arc;

use crate::context::{ChainConfig, DataDir};

#[derive(Args)]
pub struct InitArgs {
    /// Seconds a signed challenge stays valid
    #[arg(short, long, default_value_t = CHALLENGE_WINDOW_SECS)]
    window: u64,
}

pub fn run(data: &DataDir, args: InitArgs) -> Result<()> {
    if data.is_initialized() {
        bail!("Chain already initialized in {}", data.root().display());
    }

    println!("{}", "Initializing starchain...".bold().cyan());
    println!();

    let config = ChainConfig {
        challenge_window_secs: args.window,
    };
    data.save_config(&config)?;
    println!("{}  Created data directory", "✓".green().bold());

    let ledger = Ledger::new(
        LedgerConfig::from(&config),
        Arc::new(Ed25519Verifier),
        Arc::new(SystemClock),
    );
    let storage = data.open_storage()?;
    data.persist(&storage, &ledger)?;

    let genesis = ledger.latest_block();
    println!("{}  Created genesis block", "✓".green().bold());
    println!("    Hash:   {}", genesis.hash.to_hex().bright_yellow());
    println!("    Height: {}", "0".bright_cyan());
    println!(
        "{}  Challenge window: {}s",
        "✓".green().bold(),
        config.challenge_window_secs.to_string().bright_cyan()
    );

    println!();
    println!("{}", "Chain initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!(
        "  • Use {} to create a wallet",
        "starchain wallet new".bright_cyan()
    );
    println!(
        "  • Use {} to get a message to sign",
        "starchain challenge <address>".bright_cyan()
    );
    println!(
        "  • Use {} to register a star",
        "starchain star submit".bright_cyan()
    );

    Ok(())
}
