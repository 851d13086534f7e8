//! From raw bytes to resolved, latest-version, profile-applied configs.

use crate::config::{ConfigLoader, ConfigPaths, RunOptions};
use crate::error::{ConfigError, ConfigResult};
use crate::profiles::{self, ProfileActivator};
use crate::schema::latest::{Pipeline, SkaffoldConfig};
use crate::schema::validation::{check_unique_images, validate_document};
use crate::schema::{self, MigrationWarning};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// One document after upgrade and profile application.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: SkaffoldConfig,
    pub applied_profiles: Vec<String>,
    /// Version the document was written in.
    pub source_version: &'static str,
    pub warnings: Vec<MigrationWarning>,
}

/// Every document of a config file, resolved.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfigs {
    configs: Vec<ResolvedConfig>,
    default_repo: Option<String>,
}

impl ResolvedConfigs {
    pub fn configs(&self) -> &[ResolvedConfig] {
        &self.configs
    }

    /// The effective pipelines, in document order.
    pub fn pipelines(&self) -> Vec<&Pipeline> {
        self.configs
            .iter()
            .map(|resolved| &resolved.config.pipeline)
            .collect()
    }

    /// Repository prefix for images: the override from the run options, else
    /// the global config for the active kube-context.
    pub fn default_repo(&self) -> Option<&str> {
        self.default_repo.as_deref()
    }

    /// Every migration warning across documents.
    pub fn warnings(&self) -> impl Iterator<Item = &MigrationWarning> {
        self.configs.iter().flat_map(|resolved| resolved.warnings.iter())
    }

    pub fn into_configs(self) -> Vec<ResolvedConfig> {
        self.configs
    }
}

/// Resolve every document in `contents`.
pub fn resolve(contents: &str, options: &RunOptions) -> ConfigResult<ResolvedConfigs> {
    let documents = schema::parse_all(contents)?;
    let activator = ProfileActivator::new(options);

    let mut defined_profiles = BTreeSet::new();
    let mut configs = Vec::with_capacity(documents.len());
    for document in documents {
        let outcome = schema::upgrade_to_latest(document, options.strict_patch_migration)?;
        let mut config = outcome.config;
        defined_profiles.extend(config.profiles.iter().map(|profile| profile.name.clone()));

        let applied_profiles = profiles::apply_profiles(&mut config, &activator)?;
        validate_document(&config)?;
        debug!(
            name = %config.metadata.name,
            source_version = outcome.source_version,
            profiles = ?applied_profiles,
            "resolved config"
        );
        configs.push(ResolvedConfig {
            config,
            applied_profiles,
            source_version: outcome.source_version,
            warnings: outcome.warnings,
        });
    }

    if let Some(missing) = options
        .requested_profiles()
        .find(|name| !defined_profiles.contains(*name))
    {
        return Err(ConfigError::ProfileNotFound(missing.to_string()));
    }

    check_unique_images(configs.iter().enumerate().map(|(i, resolved)| {
        let images = resolved
            .config
            .pipeline
            .build
            .artifacts
            .iter()
            .map(|artifact| artifact.image.as_str());
        (document_label(i, &resolved.config), images)
    }))?;

    let default_repo = match &options.default_repo {
        Some(repo) => Some(repo.clone()),
        None => global_default_repo(&activator)?,
    };

    Ok(ResolvedConfigs {
        configs,
        default_repo,
    })
}

/// How a document is named in errors: its metadata name, else its position.
fn document_label(index: usize, config: &SkaffoldConfig) -> String {
    if config.metadata.name.is_empty() {
        format!("config[{index}]")
    } else {
        format!("config[{index}] ({})", config.metadata.name)
    }
}

/// Read and resolve a config file.
pub fn resolve_file(path: &Path, options: &RunOptions) -> ConfigResult<ResolvedConfigs> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "resolving skaffold config");
    resolve(&contents, options)
}

fn global_default_repo(activator: &ProfileActivator<'_>) -> ConfigResult<Option<String>> {
    let options = activator.options();
    let paths = match &options.global_config {
        Some(path) => ConfigPaths::with_file(path),
        None => ConfigPaths::discover(&options.environment),
    };
    let loader = ConfigLoader::load(paths)?;
    if loader.config_path().is_none() {
        return Ok(None);
    }
    Ok(loader.for_context(activator.kube_context()?).default_repo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn options() -> RunOptions {
        RunOptions {
            kube_context: Some("test".into()),
            global_config: Some("/nonexistent/skaffold/config".into()),
            environment: Environment::default(),
            ..RunOptions::new("dev")
        }
    }

    #[test]
    fn test_resolve_multiple_documents() {
        let resolved = resolve(
            r#"
apiVersion: skaffold/v1beta13
kind: Config
metadata:
  name: old
---
apiVersion: skaffold/v4beta1
kind: Config
metadata:
  name: new
"#,
            &options(),
        )
        .unwrap();

        let sources: Vec<&str> = resolved.configs().iter().map(|c| c.source_version).collect();
        assert_eq!(sources, vec!["skaffold/v1beta13", "skaffold/v4beta1"]);
        assert_eq!(resolved.pipelines().len(), 2);
        assert_eq!(resolved.default_repo(), None);
    }

    #[test]
    fn test_unmatched_profile_is_an_error() {
        let mut options = options();
        options.profiles = vec!["nope".into()];
        let err = resolve("apiVersion: skaffold/v4beta1\nkind: Config\n", &options).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound(ref name) if name == "nope"));
    }

    #[test]
    fn test_default_repo_override() {
        let mut options = options();
        options.default_repo = Some("gcr.io/override".into());
        let resolved = resolve("apiVersion: skaffold/v4beta1\nkind: Config\n", &options).unwrap();
        assert_eq!(resolved.default_repo(), Some("gcr.io/override"));
    }

    #[test]
    fn test_duplicate_images_across_documents() {
        let err = resolve(
            r#"
apiVersion: skaffold/v4beta1
kind: Config
build:
  artifacts:
  - image: app
---
apiVersion: skaffold/v1beta13
kind: Config
metadata:
  name: legacy
build:
  artifacts:
  - image: app
"#,
            &options(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "duplicate image \"app\" found in sources config[0] and config[1] (legacy): artifact image names must be unique across all configurations"
        );
    }

    #[test]
    fn test_resolve_file_missing() {
        let err = resolve_file(Path::new("/nonexistent/skaffold.yaml"), &options()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
