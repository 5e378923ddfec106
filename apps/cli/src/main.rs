//! resourcesync CLI — incremental resource harvesting for a document corpus.
//!
//! Scans corpus posts for referenced Notion pages and Google Docs/Sheets,
//! captures the ones not yet on disk, and stores them as normalized text.

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
