//! advisorygen CLI — static security advisory page generator.
//!
//! Turns a tree of advisory records into advisory pages, per-product
//! listing fragments, and a sidebar of recent advisories.

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
