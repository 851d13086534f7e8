//! Current kube-context lookup.
//!
//! Only `current-context` is read; the rest of the kubeconfig is ignored.

use super::Environment;
use crate::error::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
struct KubeConfig {
    #[serde(default, rename = "current-context")]
    current_context: String,
}

/// Kubeconfig to read: `explicit`, else the first entry of `$KUBECONFIG`,
/// else `~/.kube/config`.
pub fn kubeconfig_path(explicit: Option<&Path>, env: &Environment) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(paths) = env.get("KUBECONFIG") {
        if let Some(first) = std::env::split_paths(paths).find(|path| !path.as_os_str().is_empty()) {
            return Some(first);
        }
    }
    dirs::home_dir().map(|home| home.join(".kube").join("config"))
}

/// The kubeconfig's current context. A missing kubeconfig yields an empty context.
pub fn current_context(explicit: Option<&Path>, env: &Environment) -> ConfigResult<String> {
    let Some(path) = kubeconfig_path(explicit, env) else {
        return Ok(String::new());
    };

    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no kubeconfig found");
            return Ok(String::new());
        }
        Err(err) => {
            return Err(ConfigError::KubeContext(format!(
                "reading {}: {err}",
                path.display()
            )));
        }
    };

    if contents.trim().is_empty() {
        return Ok(String::new());
    }
    let config: KubeConfig = serde_yaml::from_str(&contents)
        .map_err(|err| ConfigError::KubeContext(format!("parsing {}: {err}", path.display())))?;
    Ok(config.current_context)
}
