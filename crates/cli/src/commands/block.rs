//! Block operations command.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use starchain_core::{DecodedPayload, Hash};

use crate::context::DataDir;

#[derive(Args)]
pub struct BlockArgs {
    #[command(subcommand)]
    command: BlockCommand,
}

#[derive(Subcommand)]
enum BlockCommand {
    /// List recent blocks
    List {
        /// Number of blocks to show
        #[arg(short, long, default_value = "10")]
        count: u64,
    },
    /// Show detailed block information
    Info {
        /// Block height or hash (hex format)
        block_id: String,
    },
}

pub fn run(data: &DataDir, args: BlockArgs) -> Result<()> {
    match args.command {
        BlockCommand::List { count } => list_blocks(data, count),
        BlockCommand::Info { block_id } => show_block_info(data, &block_id),
    }
}

fn list_blocks(data: &DataDir, count: u64) -> Result<()> {
    let storage = data.open_storage()?;
    let ledger = data.open_ledger(&storage)?;
    let stats = ledger.stats();

    println!();
    println!(
        "{} height {}, {} stars",
        "Recent Blocks:".bold().cyan(),
        stats.height.to_string().bright_cyan(),
        stats.star_count.to_string().bright_cyan()
    );
    println!();

    for block in ledger.recent_blocks(count) {
        println!(
            "  {} {} {}",
            format!("#{}", block.height).bright_black(),
            block.hash.short().bright_yellow(),
            format!("({})", block.payload).bright_black()
        );
    }

    println!();
    Ok(())
}

fn show_block_info(data: &DataDir, block_id: &str) -> Result<()> {
    let storage = data.open_storage()?;
    let ledger = data.open_ledger(&storage)?;

    // Try parsing as height first, then as hash
    let block = if let Ok(height) = block_id.parse::<u64>() {
        ledger.block_by_height(height).context("Block not found")?
    } else {
        let hash = Hash::from_hex(block_id)
            .with_context(|| format!("Invalid block hash: {}", block_id))?;
        ledger.block_by_hash(&hash).context("Block not found")?
    };

    println!();
    println!("{}", "Block Information:".bold().cyan());
    println!();
    println!("  Height:        {}", block.height.to_string().bright_cyan());
    println!("  Hash:          {}", block.hash.to_hex().bright_yellow());
    println!(
        "  Previous Hash: {}",
        block.previous_hash.to_hex().bright_black()
    );
    println!(
        "  Timestamp:     {}",
        block.timestamp.to_string().bright_black()
    );

    let issues = ledger.validate_block(block.height).unwrap_or_default();
    if issues.is_empty() {
        println!("  Integrity:     {}", "ok".green());
    } else {
        for issue in issues {
            println!("  Integrity:     {}", issue.to_string().red());
        }
    }
    println!();

    match block.decode_payload() {
        Ok(DecodedPayload::Genesis(marker)) => {
            println!("  {}", marker.bright_black());
        }
        Ok(DecodedPayload::StarClaim { address, star }) => {
            println!("{}", "Star:".bold());
            println!();
            println!("  Owner: {}", address.to_hex().bright_yellow());
            println!("  RA:    {}", star.ra);
            println!("  Dec:   {}", star.dec);
            if let Some(mag) = &star.mag {
                println!("  Mag:   {}", mag);
            }
            if let Some(cen) = &star.cen {
                println!("  Cen:   {}", cen);
            }
            println!("  Story: {}", star.story);
        }
        Err(e) => {
            println!("  {} {}", "Payload cannot be decoded:".red(), e);
        }
    }
    println!();

    Ok(())
}
