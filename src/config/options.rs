//! Options a resolution runs with, normally filled from the command line.

use super::Environment;
use std::path::PathBuf;

/// Inputs to profile activation and config resolution.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Command being run (`dev`, `run`, `build`, ...), matched by `activation.command`.
    pub command: String,
    /// Explicit profiles. A leading `-` deactivates a profile.
    pub profiles: Vec<String>,
    /// Evaluate profile `activation` blocks.
    pub profile_auto_activation: bool,
    /// Kube-context override, taking precedence over the kubeconfig.
    pub kube_context: Option<String>,
    /// Kubeconfig file override.
    pub kubeconfig: Option<PathBuf>,
    /// Default repo override, taking precedence over the global config.
    pub default_repo: Option<String>,
    /// Global config file override.
    pub global_config: Option<PathBuf>,
    /// Fail on profile patches that could not be migrated.
    pub strict_patch_migration: bool,
    pub environment: Environment,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            command: String::new(),
            profiles: Vec::new(),
            profile_auto_activation: true,
            kube_context: None,
            kubeconfig: None,
            default_repo: None,
            global_config: None,
            strict_patch_migration: false,
            environment: Environment::default(),
        }
    }
}

impl RunOptions {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    /// Explicitly requested profile names, without the deactivated ones.
    pub fn requested_profiles(&self) -> impl Iterator<Item = &str> {
        self.profiles
            .iter()
            .map(String::as_str)
            .filter(|name| !name.starts_with('-'))
    }
}
