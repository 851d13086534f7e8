//! Resolve subcommand: print the effective config for a run.

use crate::config::{Environment, RunOptions};
use crate::resolve::{ResolvedConfigs, resolve};
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// Arguments for the resolve subcommand
#[derive(Args, Debug, Default)]
pub struct ResolveArgs {
    /// Config file to resolve, or `-` for stdin
    #[arg(short, long, default_value = "skaffold.yaml", env = "SKAFFOLD_FILENAME")]
    pub filename: PathBuf,

    /// Profiles to activate; prefix with `-` to deactivate (repeatable, comma-separated)
    #[arg(
        short,
        long = "profile",
        value_name = "NAME",
        value_delimiter = ',',
        allow_hyphen_values = true,
        env = "SKAFFOLD_PROFILE"
    )]
    pub profiles: Vec<String>,

    /// Command the config is resolved for, matched by `activation.command`
    #[arg(long, default_value = "dev")]
    pub command: String,

    /// Kube-context to use instead of the kubeconfig's current context
    #[arg(long, env = "SKAFFOLD_KUBE_CONTEXT")]
    pub kube_context: Option<String>,

    /// Kubeconfig file to read the current context from
    #[arg(long, value_name = "FILE")]
    pub kubeconfig: Option<PathBuf>,

    /// Repository prefix for images, overriding the global config
    #[arg(long, env = "SKAFFOLD_DEFAULT_REPO")]
    pub default_repo: Option<String>,

    /// Global config file (default: ~/.skaffold/config)
    #[arg(long, value_name = "FILE", env = "SKAFFOLD_GLOBAL_CONFIG")]
    pub global_config: Option<PathBuf>,

    /// Only apply profiles named with --profile
    #[arg(long)]
    pub no_auto_activation: bool,

    /// Fail instead of warning on profile patches that cannot be migrated
    #[arg(long)]
    pub strict: bool,
}

impl ResolveArgs {
    pub fn run_options(&self, environment: Environment) -> RunOptions {
        RunOptions {
            command: self.command.clone(),
            profiles: self.profiles.clone(),
            profile_auto_activation: !self.no_auto_activation,
            kube_context: self.kube_context.clone(),
            kubeconfig: self.kubeconfig.clone(),
            default_repo: self.default_repo.clone(),
            global_config: self.global_config.clone(),
            strict_patch_migration: self.strict,
            environment,
        }
    }
}

/// Output for one resolved document.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedDocument<'a> {
    source_version: &'a str,
    applied_profiles: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    default_repo: Option<&'a str>,
    config: &'a crate::schema::latest::SkaffoldConfig,
}

fn render(resolved: &ResolvedConfigs) -> Result<String> {
    let documents = resolved
        .configs()
        .iter()
        .map(|config| {
            serde_yaml::to_string(&ResolvedDocument {
                source_version: config.source_version,
                applied_profiles: &config.applied_profiles,
                default_repo: resolved.default_repo(),
                config: &config.config,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .context("rendering resolved config")?;
    Ok(documents.join("---\n"))
}

pub fn run_resolve(args: &ResolveArgs) -> Result<()> {
    let options = args.run_options(Environment::from_process());
    let contents = super::read_config(&args.filename)?;
    let resolved = resolve(&contents, &options)
        .with_context(|| format!("resolving {}", args.filename.display()))?;

    for warning in resolved.warnings() {
        warn!("{warning}");
    }
    print!("{}", render(&resolved)?);
    Ok(())
}
