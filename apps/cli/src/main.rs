//! tfasync CLI — batch jobs over the TFA Matrix site tree.
//!
//! Extracts public-facing content from pages, synchronizes the canonical
//! STIX store, and injects the staged page structure and site chrome.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
