//! Global configuration types (`~/.skaffold/config`).

use crate::profiles::overlay::overlay_struct;
use serde::{Deserialize, Serialize};

/// Settings that can be given globally or per kube-context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContextConfig {
    /// Context these settings apply to. Empty for the `global` section.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kube_context: String,

    /// Repository prefix applied to image names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_repo: Option<String>,

    /// Whether the repository supports multi-level names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_level_repo: Option<bool>,

    /// Registries to reach over plain HTTP.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insecure_registries: Vec<String>,

    /// Images are built into the cluster's daemon and never pushed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_cluster: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_check: Option<bool>,
}

overlay_struct!(ContextConfig {
    kube_context,
    default_repo,
    multi_level_repo,
    insecure_registries,
    local_cluster,
    update_check,
});

/// Layout of the global config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<ContextConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kube_contexts: Vec<ContextConfig>,
}

impl GlobalConfig {
    /// Entry for `kube_context`, if any.
    pub fn context(&self, kube_context: &str) -> Option<&ContextConfig> {
        self.kube_contexts
            .iter()
            .find(|entry| entry.kube_context == kube_context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_config() {
        let config: GlobalConfig = serde_yaml::from_str(
            r#"
global:
  default-repo: gcr.io/global
  update-check: false
kubeContexts:
- kube-context: minikube
  local-cluster: true
  insecure-registries: [localhost:5000]
"#,
        )
        .unwrap();

        let global = config.global.as_ref().unwrap();
        assert_eq!(global.default_repo.as_deref(), Some("gcr.io/global"));
        assert_eq!(global.update_check, Some(false));

        let minikube = config.context("minikube").unwrap();
        assert_eq!(minikube.local_cluster, Some(true));
        assert_eq!(minikube.insecure_registries, vec!["localhost:5000".to_string()]);
        assert!(config.context("gke").is_none());
    }
}
