//! Ownership challenge command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use starchain_core::{issue_challenge, Address, Clock, SystemClock};

use crate::context::DataDir;

#[derive(Args)]
pub struct ChallengeArgs {
    /// Wallet address (hex format)
    address: String,
}

pub fn run(data: &DataDir, args: ChallengeArgs) -> Result<()> {
    let address = Address::from_hex(&args.address)
        .with_context(|| format!("Invalid address format: {}", args.address))?;
    let config = data.load_config()?;

    let message = issue_challenge(&address, SystemClock.now());

    println!("{}", message);
    eprintln!(
        "{} sign this message and submit within {}s",
        "→".bright_black(),
        config.challenge_window_secs
    );

    Ok(())
}
