//! Fix subcommand: rewrite a config file in the latest schema version.

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{self, MigrationWarning};
use anyhow::{Context, Result, bail};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Arguments for the fix subcommand
#[derive(Args, Debug)]
pub struct FixArgs {
    /// Config file to upgrade, or `-` for stdin
    #[arg(short, long, default_value = "skaffold.yaml", env = "SKAFFOLD_FILENAME")]
    pub filename: PathBuf,

    /// Write the upgraded config back instead of printing it
    #[arg(long)]
    pub overwrite: bool,

    /// Fail instead of warning on profile patches that cannot be migrated
    #[arg(long)]
    pub strict: bool,
}

/// An upgraded config file.
#[derive(Debug)]
pub struct FixedConfig {
    pub yaml: String,
    /// False when every document was already at the latest version.
    pub upgraded: bool,
    pub warnings: Vec<MigrationWarning>,
}

/// Upgrade every document of `contents` and render them back to YAML.
pub fn fix_contents(contents: &str, strict: bool) -> ConfigResult<FixedConfig> {
    let documents = schema::parse_all(contents)?;
    let upgraded = documents.iter().any(|document| !document.is_latest());

    let mut rendered = Vec::with_capacity(documents.len());
    let mut warnings = Vec::new();
    for document in documents {
        let outcome = schema::upgrade_to_latest(document, strict)?;
        rendered.push(serde_yaml::to_string(&outcome.config).map_err(ConfigError::Serialize)?);
        warnings.extend(outcome.warnings);
    }

    Ok(FixedConfig {
        yaml: rendered.join("---\n"),
        upgraded,
        warnings,
    })
}

pub fn run_fix(args: &FixArgs) -> Result<()> {
    if args.overwrite && args.filename == Path::new(super::STDIN) {
        bail!("--overwrite needs a file, not stdin");
    }
    let contents = super::read_config(&args.filename)?;
    let fixed = fix_contents(&contents, args.strict)
        .with_context(|| format!("upgrading {}", args.filename.display()))?;

    for warning in &fixed.warnings {
        warn!("{warning}");
    }

    if !fixed.upgraded {
        info!(path = %args.filename.display(), "config is already at the latest version");
        if !args.overwrite {
            print!("{}", fixed.yaml);
        }
        return Ok(());
    }

    if args.overwrite {
        fs::write(&args.filename, &fixed.yaml)
            .with_context(|| format!("writing {}", args.filename.display()))?;
        info!(
            path = %args.filename.display(),
            version = schema::latest::VERSION,
            "config upgraded"
        );
    } else {
        print!("{}", fixed.yaml);
    }
    Ok(())
}
