//! Global config loader.
//!
//! Settings for a kube-context start empty, then the file's `global` section
//! and the file's entry for that context are overlaid in turn, using the same
//! rules as profiles: set values replace, empty values keep what is there.

use super::Environment;
use super::types::{ContextConfig, GlobalConfig};
use crate::error::{ConfigError, ConfigResult};
use crate::profiles::overlay::Overlay;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the global config file lives.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub global_config: Option<PathBuf>,
}

impl ConfigPaths {
    /// `SKAFFOLD_GLOBAL_CONFIG`, else `~/.skaffold/config`.
    pub fn discover(env: &Environment) -> Self {
        let global_config = env
            .get("SKAFFOLD_GLOBAL_CONFIG")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".skaffold").join("config")));
        Self { global_config }
    }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config: Some(path.into()),
        }
    }
}

/// Loaded global config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: GlobalConfig,
    /// Set when the file existed and was read.
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load the file at `paths`. A missing file behaves like an empty one.
    pub fn load(paths: ConfigPaths) -> ConfigResult<Self> {
        let Some(path) = paths.global_config else {
            return Ok(Self::default());
        };

        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no global config");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let config = if contents.trim().is_empty() {
            GlobalConfig::default()
        } else {
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::GlobalConfig {
                path: path.clone(),
                source,
            })?
        };

        Ok(Self {
            config,
            config_path: Some(path),
        })
    }

    /// Effective settings for `kube_context`.
    pub fn for_context(&self, kube_context: &str) -> ContextConfig {
        let mut config = ContextConfig::default();
        if let Some(global) = &self.config.global {
            config.overlay(global.clone());
        }
        let entry = self.config.context(kube_context);
        if let Some(entry) = entry {
            config.overlay(entry.clone());
        }
        debug!(
            kube_context,
            global = self.config.global.is_some(),
            context_entry = entry.is_some(),
            "resolved global config"
        );
        config.kube_context = kube_context.to_string();
        config
    }

    /// Get the config file path that was read.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
