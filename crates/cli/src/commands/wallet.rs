//! Wallet keypair commands.
//!
//! Real owners sign challenges with their own wallet software. These
//! commands cover the same role for local use.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use starchain_core::Keypair;

use crate::context::DataDir;

#[derive(Args)]
pub struct WalletArgs {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand)]
enum WalletCommand {
    /// Generate a new keypair
    New {
        /// Name for the keypair file
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List stored keypairs
    List,
    /// Sign a challenge message
    Sign {
        /// Keypair name (file name without .json)
        #[arg(short, long)]
        name: String,

        /// Message to sign, as printed by `starchain challenge`
        #[arg(short, long)]
        message: String,
    },
}

pub fn run(data: &DataDir, args: WalletArgs) -> Result<()> {
    match args.command {
        WalletCommand::New { name } => new_keypair(data, name),
        WalletCommand::List => list_keypairs(data),
        WalletCommand::Sign { name, message } => sign_message(data, &name, &message),
    }
}

fn new_keypair(data: &DataDir, name: Option<String>) -> Result<()> {
    let keypair = Keypair::generate();
    let address = keypair.address();
    let name = name.unwrap_or_else(|| format!("wallet_{}", &address.to_hex()[2..10]));

    let key_file = data.save_keypair(&name, &keypair)?;

    println!("{}", "Generated new keypair:".bold().cyan());
    println!();
    println!("  Name:        {}", name.bright_cyan());
    println!("  Address:     {}", address.to_hex().bright_yellow());
    println!(
        "  Public Key:  {}",
        hex::encode(keypair.public_key.as_bytes()).bright_black()
    );
    println!();
    println!(
        "{}  Saved to: {}",
        "✓".green().bold(),
        key_file.display().to_string().bright_black()
    );
    println!();
    println!("{}", "Keep your private key safe!".yellow().bold());

    Ok(())
}

fn list_keypairs(data: &DataDir) -> Result<()> {
    let entries = data.list_keypairs()?;

    println!();
    if entries.is_empty() {
        println!("  No keypairs found in {}", data.keys_dir().display());
        println!();
        return Ok(());
    }

    println!("{}", "Keypairs:".bold().cyan());
    println!();
    for (name, address) in entries {
        println!("  {:<20} {}", name.bright_cyan(), address.bright_yellow());
    }
    println!();

    Ok(())
}

fn sign_message(data: &DataDir, name: &str, message: &str) -> Result<()> {
    let keypair = data.load_keypair(name)?;
    let signature = keypair.sign_message(message);

    println!("{}", signature.encode());
    Ok(())
}
