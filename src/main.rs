//! Skaffold config tool
//!
//! Upgrades skaffold config files to the latest schema version and prints the
//! effective config after profile activation.

use anyhow::Result;
use clap::Parser;
use skaffold_config::cli::Cli;
use skaffold_config::logging;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log, cli.verbose)?;
    debug!(command = ?cli.command, "starting");
    cli.run()
}
