//! CLI commands module.

use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

use crate::context::DataDir;

mod block;
mod challenge;
mod init;
mod star;
mod validate;
mod wallet;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new chain
    Init(init::InitArgs),
    /// Wallet keypairs (stand-in for external wallet software)
    Wallet(wallet::WalletArgs),
    /// Issue an ownership challenge for an address
    Challenge(challenge::ChallengeArgs),
    /// Register and look up stars
    Star(star::StarArgs),
    /// Block operations
    Block(block::BlockArgs),
    /// Check every block's hash and link
    Validate,
}

pub fn run(cmd: Commands, data_dir: &Path) -> Result<()> {
    let data = DataDir::new(data_dir);
    match cmd {
        Commands::Init(args) => init::run(&data, args),
        Commands::Wallet(args) => wallet::run(&data, args),
        Commands::Challenge(args) => challenge::run(&data, args),
        Commands::Star(args) => star::run(&data, args),
        Commands::Block(args) => block::run(&data, args),
        Commands::Validate => validate::run(&data),
    }
}
