//! clubfeed ingest: club form responses to an OpenActive collection.
//!
//! Reads every listed spreadsheet, maps verified responses to club records
//! and atomically replaces the published artifact.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
