//! Star registration and lookup commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use starchain_core::{Address, Star};

use crate::context::DataDir;

#[derive(Args)]
pub struct StarArgs {
    #[command(subcommand)]
    command: StarCommand,
}

#[derive(Subcommand)]
enum StarCommand {
    /// Register a star using a signed challenge
    Submit {
        /// Owner wallet address (hex format)
        #[arg(short, long)]
        address: String,

        /// Challenge message, as printed by `starchain challenge`
        #[arg(short, long)]
        message: String,

        /// Wallet signature over the message (hex)
        #[arg(short, long)]
        signature: String,

        /// Right ascension
        #[arg(long, allow_hyphen_values = true)]
        ra: String,

        /// Declination
        #[arg(long, allow_hyphen_values = true)]
        dec: String,

        /// Magnitude
        #[arg(long, allow_hyphen_values = true)]
        mag: Option<String>,

        /// Constellation
        #[arg(long)]
        cen: Option<String>,

        /// Story (ASCII, up to 500 bytes)
        #[arg(long)]
        story: String,
    },
    /// List the stars owned by an address
    List {
        /// Owner wallet address (hex format)
        address: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

pub fn run(data: &DataDir, args: StarArgs) -> Result<()> {
    match args.command {
        StarCommand::Submit {
            address,
            message,
            signature,
            ra,
            dec,
            mag,
            cen,
            story,
        } => {
            let star = Star {
                ra,
                dec,
                mag,
                cen,
                story,
            };
            submit(data, &address, &message, &signature, star)
        }
        StarCommand::List { address, json } => list(data, &address, json),
    }
}

fn parse_address(address: &str) -> Result<Address> {
    Address::from_hex(address).with_context(|| format!("Invalid address format: {}", address))
}

fn submit(data: &DataDir, address: &str, message: &str, signature: &str, star: Star) -> Result<()> {
    let address = parse_address(address)?;
    let storage = data.open_storage()?;
    let ledger = data.open_ledger(&storage)?;

    let block = ledger
        .submit(&address, message, signature, star)
        .context("Star registration rejected")?;
    data.persist(&storage, &ledger)?;

    println!();
    println!("{}  Star registered", "✓".green().bold());
    println!("    Owner:  {}", address.to_hex().bright_yellow());
    println!("    Hash:   {}", block.hash.to_hex().bright_yellow());
    println!("    Height: {}", block.height.to_string().bright_cyan());
    println!();

    Ok(())
}

fn list(data: &DataDir, address: &str, json: bool) -> Result<()> {
    let address = parse_address(address)?;
    let storage = data.open_storage()?;
    let ledger = data.open_ledger(&storage)?;

    let records = ledger.stars_by_address(&address)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!();
    println!(
        "{} {}",
        "Stars owned by".bold().cyan(),
        address.to_hex().bright_yellow()
    );
    println!();

    if records.is_empty() {
        println!("  None");
        println!();
        return Ok(());
    }

    for record in &records {
        let star = &record.star;
        println!(
            "  {} {}  ra {}  dec {}",
            format!("#{}", record.height).bright_black(),
            record.hash.short().bright_yellow(),
            star.ra.bright_cyan(),
            star.dec.bright_cyan()
        );
        if let Some(mag) = &star.mag {
            println!("      mag:   {}", mag);
        }
        if let Some(cen) = &star.cen {
            println!("      cen:   {}", cen);
        }
        println!("      story: {}", star.story);
    }
    println!();

    Ok(())
}
