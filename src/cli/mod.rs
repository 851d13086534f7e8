//! CLI command definitions for skaffold-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod fix;
pub mod resolve;
pub mod schemas;

use crate::logging::LogTarget;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fix::FixArgs;
use resolve::ResolveArgs;
use std::io::Read;
use std::path::Path;

/// File name that reads the config from stdin.
pub const STDIN: &str = "-";

/// Upgrade and resolve skaffold config files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: LogTarget,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upgrade a config file to the latest schema version
    Fix(FixArgs),

    /// Print the effective config after upgrade and profile application
    Resolve(ResolveArgs),

    /// List the supported schema versions
    Schemas,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Command::Fix(args) => fix::run_fix(args),
            Command::Resolve(args) => resolve::run_resolve(args),
            Command::Schemas => schemas::run_schemas(),
        }
    }
}

/// Read a config file, or stdin for `-`.
pub(crate) fn read_config(path: &Path) -> Result<String> {
    if path == Path::new(STDIN) {
        let mut contents = String::new();
        std::io::stdin()
            .read_to_string(&mut contents)
            .context("reading config from stdin")?;
        return Ok(contents);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
