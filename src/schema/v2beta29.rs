//! `skaffold/v2beta29`, the last version where manifests live under `deploy`.
//!
//! Upgrading to `skaffold/v4beta1` splits each deployer into a render part
//! (`manifests`) and a deploy part, so this is the step with most rewrites.

use super::latest as next;
use super::upgrade::{MigrationWarning, PathMigrations, upgrade_pipelines};
use super::validation::{Validate, check_each, check_one_of, one_of};
use super::util::{
    self, Activation, JsonPatch, Metadata, UnknownFields, is_default,
    sanitize_helm_template_value, versioned_document,
};
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub use super::v2alpha3::{
    Artifact, BazelArtifact, BuildConfig, ClusterDetails, DateTimeTagger, DockerArtifact,
    EnvTemplateTagger, GitTagger, GoogleCloudBuild, HelmConventionConfig, HelmDeployFlags,
    HelmFqnConfig, HelmImageStrategy, JibArtifact, KubectlFlags, LocalBuild, ShaTagger,
    TagPolicy, TestCase,
};

pub const VERSION: &str = "skaffold/v2beta29";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkaffoldConfig {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub pipeline: Pipeline,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<Profile>,
    #[serde(default, flatten)]
    pub unknown_fields: UnknownFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default, skip_serializing_if = "is_default")]
    pub build: BuildConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test: Vec<TestCase>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub deploy: DeployConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeployConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<HelmDeploy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubectl: Option<KubectlDeploy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kustomize: Option<KustomizeDeploy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kpt: Option<KptDeploy>,
    /// Wait for deployed resources to stabilize.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_check: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kube_context: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HelmDeploy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub releases: Vec<HelmRelease>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub flags: HelmDeployFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HelmRelease {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chart_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remote_chart: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values_files: Vec<String>,
    /// Helm value key to image name. Replaced by `setValueTemplates` in v4.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub artifact_overrides: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_value_templates: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub wait: bool,
    #[serde(default, skip_serializing_if = "is_default")]
    pub image_strategy: HelmImageStrategy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KubectlDeploy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manifests: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_manifests: Vec<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub flags: KubectlFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KustomizeDeploy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_args: Vec<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub flags: KubectlFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_namespace: Option<String>,
}

/// Removed in `skaffold/v4beta1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KptDeploy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dir: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activation: Vec<Activation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<JsonPatch>,
    #[serde(flatten)]
    pub pipeline: Pipeline,
    #[serde(default, flatten)]
    pub unknown_fields: UnknownFields,
}

versioned_document!(SkaffoldConfig, Pipeline);

one_of!(HelmRelease as "chartSource" { chart_path: "chartPath", remote_chart: "remoteChart" });

impl Validate for HelmRelease {
    fn validate(&self, path: &str) -> ConfigResult<()> {
        check_one_of(path, self)?;
        check_one_of(&format!("{path}/imageStrategy"), &self.image_strategy)
    }
}

impl Validate for Pipeline {
    fn validate(&self, path: &str) -> ConfigResult<()> {
        self.build.validate(&format!("{path}/build"))?;
        if let Some(helm) = &self.deploy.helm {
            check_each(&format!("{path}/deploy/helm/releases"), &helm.releases)?;
        }
        Ok(())
    }
}

/// Parse a `skaffold/v2beta29` document, rejecting unknown fields.
pub fn parse(contents: &str) -> ConfigResult<SkaffoldConfig> {
    util::parse_strict(contents)
}

static PATCH_MIGRATIONS: PathMigrations = PathMigrations {
    from_version: VERSION,
    to_version: next::VERSION,
    renames: &[
        ("/deploy/kubectl/manifests", "/manifests/rawYaml"),
        ("/deploy/kustomize/paths", "/manifests/kustomize/paths"),
        ("/deploy/kustomize/buildArgs", "/manifests/kustomize/buildArgs"),
        ("/deploy/helm", "/manifests/helm"),
    ],
    unmapped: &["/deploy/kpt", "/deploy/kustomize"],
};

impl SkaffoldConfig {
    /// Upgrade to `skaffold/v4beta1`.
    pub fn upgrade(&self, warnings: &mut Vec<MigrationWarning>) -> ConfigResult<next::SkaffoldConfig> {
        let mut new_config = next::SkaffoldConfig {
            api_version: next::VERSION.to_string(),
            kind: self.kind.clone(),
            metadata: self.metadata.clone(),
            profiles: self
                .profiles
                .iter()
                .map(|profile| next::Profile {
                    name: profile.name.clone(),
                    activation: profile.activation.clone(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        upgrade_pipelines(self, &mut new_config, upgrade_one_pipeline)?;

        for (old, new) in self.profiles.iter().zip(&mut new_config.profiles) {
            // Profiles without their own helm deployer patch the main one.
            let helm = old
                .pipeline
                .deploy
                .helm
                .as_ref()
                .or(self.pipeline.deploy.helm.as_ref());
            new.patches = upgrade_patches(&old.name, &old.patches, helm, warnings);
        }
        Ok(new_config)
    }
}

fn upgrade_one_pipeline(old: &Pipeline, new: &mut next::Pipeline) -> ConfigResult<()> {
    let deploy = &old.deploy;
    if deploy.kpt.is_some() {
        return Err(ConfigError::UnsupportedMigration {
            version: VERSION,
            feature: "deploy.kpt",
        });
    }

    new.build = old.build.clone();
    new.test = old.test.clone();
    new.deploy.status_check = deploy.status_check;
    new.deploy.kube_context = deploy.kube_context.clone();

    if let Some(kubectl) = &deploy.kubectl {
        new.manifests.raw_yaml = kubectl.manifests.clone();
        new.deploy.kubectl = Some(next::KubectlDeploy {
            remote_manifests: kubectl.remote_manifests.clone(),
            flags: kubectl.flags.clone(),
            default_namespace: kubectl.default_namespace.clone(),
        });
    }

    if let Some(kustomize) = &deploy.kustomize {
        let paths = if kustomize.paths.is_empty() {
            vec![".".to_string()]
        } else {
            kustomize.paths.clone()
        };
        new.manifests.kustomize = Some(next::Kustomize {
            paths,
            build_args: kustomize.build_args.clone(),
        });
        merge_kustomize_into_kubectl(&mut new.deploy, kustomize)?;
    }

    if let Some(helm) = &deploy.helm {
        let releases: Vec<next::HelmRelease> = helm.releases.iter().map(upgrade_release).collect();
        new.manifests.helm = Some(next::Helm {
            releases: releases.clone(),
            flags: helm.flags.clone(),
        });
        // v1 used the release namespace for both rendering and `--namespace`.
        new.deploy.helm = Some(next::LegacyHelmDeploy {
            releases,
            flags: helm.flags.clone(),
        });
    }
    Ok(())
}

/// Kustomize manifests are applied by the kubectl deployer from v4 on.
fn merge_kustomize_into_kubectl(
    deploy: &mut next::DeployConfig,
    kustomize: &KustomizeDeploy,
) -> ConfigResult<()> {
    let Some(kubectl) = deploy.kubectl.as_mut() else {
        deploy.kubectl = Some(next::KubectlDeploy {
            remote_manifests: Vec::new(),
            flags: kustomize.flags.clone(),
            default_namespace: kustomize.default_namespace.clone(),
        });
        return Ok(());
    };

    if let (Some(current), Some(incoming)) = (&kubectl.default_namespace, &kustomize.default_namespace) {
        if current != incoming {
            return Err(ConfigError::IncompatibleDeployers {
                property: "defaultNamespace",
            });
        }
    }
    if kubectl.flags.disable_validation != kustomize.flags.disable_validation {
        return Err(ConfigError::IncompatibleDeployers {
            property: "disableValidation",
        });
    }

    if kustomize.default_namespace.is_some() {
        kubectl.default_namespace = kustomize.default_namespace.clone();
    }
    kubectl.flags.global.extend(kustomize.flags.global.iter().cloned());
    kubectl.flags.apply.extend(kustomize.flags.apply.iter().cloned());
    kubectl.flags.delete.extend(kustomize.flags.delete.iter().cloned());
    Ok(())
}

fn upgrade_release(old: &HelmRelease) -> next::HelmRelease {
    let mut set_value_templates = old.set_value_templates.clone();
    for (key, image) in &old.artifact_overrides {
        for (suffix, template) in image_templates(&old.image_strategy, image) {
            set_value_templates.insert(format!("{key}{suffix}"), template);
        }
    }

    next::HelmRelease {
        name: old.name.clone(),
        chart_path: old.chart_path.clone(),
        remote_chart: old.remote_chart.clone(),
        values_files: old.values_files.clone(),
        namespace: old.namespace.clone(),
        version: old.version.clone(),
        set_values: old.set_values.clone(),
        set_value_templates,
        wait: old.wait,
    }
}

/// `(key suffix, template)` pairs replacing one artifact override.
fn image_templates(strategy: &HelmImageStrategy, image: &str) -> Vec<(&'static str, String)> {
    let image = sanitize_helm_template_value(image);
    match &strategy.helm {
        None => vec![("", format!("{{{{.IMAGE_FULLY_QUALIFIED_{image}}}}}"))],
        Some(helm) if helm.explicit_registry => vec![
            (".tag", format!("{{{{.IMAGE_TAG_{image}}}}}@{{{{.IMAGE_DIGEST_{image}}}}}")),
            (".registry", format!("{{{{.IMAGE_DOMAIN_{image}}}}}")),
            (".repository", format!("{{{{.IMAGE_REPO_NO_DOMAIN_{image}}}}}")),
        ],
        Some(_) => vec![
            (".tag", format!("{{{{.IMAGE_TAG_{image}}}}}@{{{{.IMAGE_DIGEST_{image}}}}}")),
            (".repository", format!("{{{{.IMAGE_REPO_{image}}}}}")),
        ],
    }
}

/// Release index of a `/deploy/helm/releases/N/artifactOverrides/<key>` patch path.
fn artifact_override_release(path: &str) -> Option<usize> {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        ["", "deploy", "helm", "releases", index, "artifactOverrides", _key] => index.parse().ok(),
        _ => None,
    }
}

/// Whether `path` targets a helm release field that `skaffold/v4beta1` dropped
/// and that [`artifact_override_release`] cannot rewrite.
fn targets_removed_release_field(path: &str) -> bool {
    let segments: Vec<&str> = path.split('/').collect();
    matches!(
        segments.as_slice(),
        ["", "deploy", "helm", "releases", _, "artifactOverrides" | "imageStrategy", ..]
    )
}

/// Rewrite one profile's patches for `skaffold/v4beta1`.
///
/// The result is the migrated patches in order, then the extra patches that
/// helm image strategies need, then copies of the original helm patches so
/// they keep targeting the legacy `deploy.helm` deployer.
fn upgrade_patches(
    profile: &str,
    patches: &[JsonPatch],
    helm: Option<&HelmDeploy>,
    warnings: &mut Vec<MigrationWarning>,
) -> Vec<JsonPatch> {
    let mut migrated = Vec::with_capacity(patches.len());
    let mut extra = Vec::new();
    let mut legacy_helm = Vec::new();

    for patch in patches {
        if let Some(index) = artifact_override_release(&patch.path) {
            let rewritten = helm
                .and_then(|helm| helm.releases.get(index))
                .zip(patch.value.as_ref().and_then(|value| value.as_str()))
                .map(|(release, image)| rewrite_artifact_override(patch, release, image));
            match rewritten {
                Some(mut rewritten) => {
                    migrated.push(rewritten.remove(0));
                    extra.extend(rewritten);
                }
                None => {
                    warnings.push(PATCH_MIGRATIONS.warning(profile, &patch.path));
                    migrated.push(patch.clone());
                }
            }
            continue;
        }

        if targets_removed_release_field(&patch.path) {
            warnings.push(PATCH_MIGRATIONS.warning(profile, &patch.path));
            migrated.push(patch.clone());
            continue;
        }

        if patch.path.starts_with("/deploy/helm") {
            legacy_helm.push(patch.clone());
        }

        let mut patch = patch.clone();
        PATCH_MIGRATIONS.migrate_patches(profile, std::slice::from_mut(&mut patch), warnings);
        migrated.push(patch);
    }

    debug!(
        profile,
        migrated = migrated.len(),
        extra = extra.len(),
        duplicated = legacy_helm.len(),
        "upgraded profile patches"
    );
    migrated.extend(extra);
    migrated.extend(legacy_helm);
    migrated
}

/// One patch per template of the release's image strategy, first one in place of `patch`.
fn rewrite_artifact_override(patch: &JsonPatch, release: &HelmRelease, image: &str) -> Vec<JsonPatch> {
    let path = patch
        .path
        .replacen("/deploy/helm", "/manifests/helm", 1)
        .replacen("/artifactOverrides/", "/setValueTemplates/", 1);

    image_templates(&release.image_strategy, image)
        .into_iter()
        .map(|(suffix, template)| JsonPatch {
            op: patch.op.clone(),
            path: format!("{path}{suffix}"),
            from: patch.from.clone(),
            value: Some(serde_json::Value::String(template)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upgrade(yaml: &str) -> ConfigResult<(next::SkaffoldConfig, Vec<MigrationWarning>)> {
        let mut warnings = Vec::new();
        let upgraded = parse(yaml)?.upgrade(&mut warnings)?;
        Ok((upgraded, warnings))
    }

    #[test]
    fn test_kubectl_manifests_move_to_raw_yaml() {
        let (upgraded, _) = upgrade(
            r#"
apiVersion: skaffold/v2beta29
kind: Config
deploy:
  kubectl:
    manifests: [k8s/*.yaml]
    defaultNamespace: dev
"#,
        )
        .unwrap();

        assert_eq!(upgraded.pipeline.manifests.raw_yaml, vec!["k8s/*.yaml".to_string()]);
        let kubectl = upgraded.pipeline.deploy.kubectl.unwrap();
        assert_eq!(kubectl.default_namespace.as_deref(), Some("dev"));
    }

    #[test]
    fn test_kustomize_defaults_paths_and_merges_into_kubectl() {
        let (upgraded, _) = upgrade(
            r#"
apiVersion: skaffold/v2beta29
kind: Config
deploy:
  kubectl:
    flags:
      apply: [--force]
  kustomize:
    flags:
      apply: [--server-side]
"#,
        )
        .unwrap();

        let kustomize = upgraded.pipeline.manifests.kustomize.unwrap();
        assert_eq!(kustomize.paths, vec![".".to_string()]);
        let kubectl = upgraded.pipeline.deploy.kubectl.unwrap();
        assert_eq!(
            kubectl.flags.apply,
            vec!["--force".to_string(), "--server-side".to_string()]
        );
    }

    #[test]
    fn test_kustomize_conflicting_namespace() {
        let err = upgrade(
            r#"
apiVersion: skaffold/v2beta29
kind: Config
deploy:
  kubectl:
    defaultNamespace: a
  kustomize:
    defaultNamespace: b
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::IncompatibleDeployers {
                property: "defaultNamespace"
            }
        ));
    }

    #[test]
    fn test_kpt_is_rejected() {
        let err = upgrade(
            r#"
apiVersion: skaffold/v2beta29
kind: Config
deploy:
  kpt:
    dir: config
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("deploy.kpt"));
    }

    #[test]
    fn test_artifact_overrides_become_templates() {
        let (upgraded, _) = upgrade(
            r#"
apiVersion: skaffold/v2beta29
kind: Config
deploy:
  helm:
    releases:
    - name: fqn
      chartPath: charts/a
      artifactOverrides:
        image: gcr.io/k8s-skaffold/app
    - name: conventional
      chartPath: charts/b
      artifactOverrides:
        image: app-b
      imageStrategy:
        helm:
          explicitRegistry: true
"#,
        )
        .unwrap();

        let helm = upgraded.pipeline.manifests.helm.unwrap();
        assert_eq!(
            helm.releases[0].set_value_templates["image"],
            "{{.IMAGE_FULLY_QUALIFIED_gcr_io_k8s_skaffold_app}}"
        );
        let templates = &helm.releases[1].set_value_templates;
        assert_eq!(templates["image.tag"], "{{.IMAGE_TAG_app_b}}@{{.IMAGE_DIGEST_app_b}}");
        assert_eq!(templates["image.registry"], "{{.IMAGE_DOMAIN_app_b}}");
        assert_eq!(templates["image.repository"], "{{.IMAGE_REPO_NO_DOMAIN_app_b}}");

        let legacy = upgraded.pipeline.deploy.helm.unwrap();
        assert_eq!(legacy.releases, helm.releases);
    }

    #[test]
    fn test_profile_patches_are_migrated_and_duplicated() {
        let (upgraded, warnings) = upgrade(
            r#"
apiVersion: skaffold/v2beta29
kind: Config
deploy:
  helm:
    releases:
    - name: app
      chartPath: charts/app
      artifactOverrides:
        image: app
      imageStrategy:
        helm: {}
profiles:
- name: dev
  patches:
  - path: /deploy/kubectl/manifests/0
    value: dev.yaml
  - path: /deploy/helm/releases/0/artifactOverrides/image
    value: app-dev
  - path: /deploy/helm/releases/0/namespace
    value: dev
  - path: /deploy/kustomize/flags/apply
    value: []
"#,
        )
        .unwrap();

        let paths: Vec<&str> = upgraded.profiles[0]
            .patches
            .iter()
            .map(|patch| patch.path.as_str())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/manifests/rawYaml/0",
                "/manifests/helm/releases/0/setValueTemplates/image.tag",
                "/manifests/helm/releases/0/namespace",
                "/deploy/kustomize/flags/apply",
                "/manifests/helm/releases/0/setValueTemplates/image.repository",
                "/deploy/helm/releases/0/namespace",
            ]
        );
        assert_eq!(
            upgraded.profiles[0].patches[4].value,
            Some(serde_json::json!("{{.IMAGE_REPO_app_dev}}"))
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path, "/deploy/kustomize/flags/apply");
    }

    #[test]
    fn test_patches_on_removed_release_fields_warn() {
        let (upgraded, warnings) = upgrade(
            r#"
apiVersion: skaffold/v2beta29
kind: Config
deploy:
  helm:
    releases:
    - name: app
      chartPath: charts/app
profiles:
- name: dev
  patches:
  - path: /deploy/helm/releases/0/artifactOverrides
    value:
      image: other
  - path: /deploy/helm/releases/0/imageStrategy/helm
    value: {}
"#,
        )
        .unwrap();

        let paths: Vec<&str> = upgraded.profiles[0]
            .patches
            .iter()
            .map(|patch| patch.path.as_str())
            .collect();
        assert_eq!(
            paths,
            vec![
                "/deploy/helm/releases/0/artifactOverrides",
                "/deploy/helm/releases/0/imageStrategy/helm",
            ]
        );
        let warned: Vec<&str> = warnings.iter().map(|warning| warning.path.as_str()).collect();
        assert_eq!(warned, paths);
    }

    #[test]
    fn test_removed_release_field_paths() {
        assert!(targets_removed_release_field("/deploy/helm/releases/0/artifactOverrides"));
        assert!(targets_removed_release_field("/deploy/helm/releases/2/imageStrategy"));
        assert!(targets_removed_release_field("/deploy/helm/releases/0/artifactOverrides/a/b"));
        assert!(!targets_removed_release_field("/deploy/helm/releases/0/namespace"));
        assert!(!targets_removed_release_field("/deploy/helm/flags"));
    }

    #[test]
    fn test_release_unions_are_exclusive() {
        let config = parse(
            r#"
apiVersion: skaffold/v2beta29
kind: Config
deploy:
  helm:
    releases:
    - name: local
      chartPath: charts/app
    - name: remote
      chartPath: charts/app
      remoteChart: stable/app
"#,
        )
        .unwrap();
        let err = config.pipeline.validate("").unwrap_err();
        assert_eq!(
            err.to_string(),
            "/deploy/helm/releases/1: only one of [chartPath, remoteChart] can be set (oneOf=chartSource)"
        );

        let config = parse(
            r#"
apiVersion: skaffold/v2beta29
kind: Config
deploy:
  helm:
    releases:
    - name: app
      chartPath: charts/app
      imageStrategy:
        fqn: {}
        helm: {}
"#,
        )
        .unwrap();
        let err = config.pipeline.validate("").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OneOfViolation { ref path, union: "helmImageStrategy", .. }
                if path == "/deploy/helm/releases/0/imageStrategy"
        ));
    }
}
