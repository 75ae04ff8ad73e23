//! starchain CLI entry point.

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

mod commands;
mod context;
mod logging;

use logging::LogFormat;

#[derive(Parser)]
#[command(name = "starchain")]
#[command(about = "A single-node star registry ledger", long_about = None)]
struct Cli {
    /// Directory holding chain data, keys and config
    #[arg(short, long, global = true, default_value = "./data")]
    data_dir: PathBuf,

    /// Default log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: commands::Commands,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    if let Err(e) = commands::run(cli.command, &cli.data_dir) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
