// crates/immunoflux/src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod inputs;

use commands::convert::{handle_convert_command, ConvertArgs};
use commands::gating::{handle_gating_command, GatingArgs};
use commands::process::{handle_process_command, ProcessArgs};

/// Reconciles flow-cytometry donor panel exports into per-donor derived metrics.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive, combine and reconcile metrics from panel exports
    Process(ProcessArgs),
    /// Reorder panel exports into the canonical per-donor row format
    Convert(ConvertArgs),
    /// Summarise a gating panel definition
    Gating(GatingArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Process(args) => handle_process_command(args).await,
        Command::Convert(args) => handle_convert_command(args),
        Command::Gating(args) => handle_gating_command(args),
    }
}
