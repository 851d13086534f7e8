//! `skaffold/v2alpha3`.
//!
//! Jib artifacts are unified under `jib`, kustomize takes a list of `paths`
//! and deploy stops being a oneOf so several deployers can run together.

use super::upgrade::upgrade_pipelines;
use super::util::{
    self, Activation, JsonPatch, Metadata, UnknownFields, clone_through_json, is_default,
    versioned_document,
};
use super::v2beta29 as next;
use super::validation::{Validate, check_each, check_one_of, one_of};
use super::MigrationWarning;
use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};

pub use super::v1beta13::{
    BazelArtifact, ClusterDetails, DateTimeTagger, DockerArtifact, EnvTemplateTagger,
    GitTagger, GoogleCloudBuild, HelmConventionConfig, HelmDeploy, HelmDeployFlags,
    HelmFqnConfig, HelmImageStrategy, HelmRelease, KubectlDeploy, KubectlFlags, LocalBuild,
    ShaTagger, TagPolicy, TestCase,
};

pub const VERSION: &str = "skaffold/v2alpha3";

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
pub struct BuildConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insecure_registries: Vec<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub tag_policy: TagPolicy,

    // oneOf=build
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalBuild>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_cloud_build: Option<GoogleCloudBuild>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Artifact {
    pub image: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,

    // oneOf=artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bazel: Option<BazelArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jib: Option<JibArtifact>,
}

/// Jib build, for Maven or Gradle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JibArtifact {
    /// Maven module or Gradle project to build.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// `maven` or `gradle`. Detected from the workspace when empty.
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub builder_type: String,
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
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kube_context: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KustomizeDeploy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub flags: KubectlFlags,
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

one_of!(Artifact as "artifact" { docker: "docker", bazel: "bazel", jib: "jib" });

impl Validate for Artifact {
    fn validate(&self, path: &str) -> ConfigResult<()> {
        check_one_of(path, self)
    }
}

/// Shared with every later version.
impl Validate for BuildConfig {
    fn validate(&self, path: &str) -> ConfigResult<()> {
        check_one_of(path, self)?;
        check_one_of(&format!("{path}/tagPolicy"), &self.tag_policy)?;
        check_each(&format!("{path}/artifacts"), &self.artifacts)
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

/// Parse a `skaffold/v2alpha3` document, rejecting unknown fields.
pub fn parse(contents: &str) -> ConfigResult<SkaffoldConfig> {
    util::parse_strict(contents)
}

impl SkaffoldConfig {
    /// Upgrade to `skaffold/v2beta29`. Every patch path of this version still
    /// exists in the next one, apart from the helm `values` rename.
    pub fn upgrade(&self, _warnings: &mut Vec<MigrationWarning>) -> ConfigResult<next::SkaffoldConfig> {
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
                    patches: profile.patches.clone(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        upgrade_pipelines(self, &mut new_config, upgrade_one_pipeline)?;

        for profile in &mut new_config.profiles {
            for patch in &mut profile.patches {
                if let Some(path) = rename_release_values(&patch.path) {
                    patch.path = path;
                }
            }
        }
        Ok(new_config)
    }
}

fn upgrade_one_pipeline(old: &Pipeline, new: &mut next::Pipeline) -> ConfigResult<()> {
    new.build = old.build.clone();
    new.test = old.test.clone();

    new.deploy = next::DeployConfig {
        helm: old
            .deploy
            .helm
            .as_ref()
            .map(|helm| next::HelmDeploy {
                releases: helm.releases.iter().map(upgrade_release).collect(),
                flags: helm.flags.clone(),
            }),
        kubectl: clone_through_json(&old.deploy.kubectl)?,
        kustomize: clone_through_json(&old.deploy.kustomize)?,
        kube_context: old.deploy.kube_context.clone(),
        ..Default::default()
    };
    Ok(())
}

fn upgrade_release(old: &HelmRelease) -> next::HelmRelease {
    next::HelmRelease {
        name: old.name.clone(),
        chart_path: old.chart_path.clone(),
        values_files: old.values_files.clone(),
        artifact_overrides: old.values.clone(),
        namespace: old.namespace.clone(),
        version: old.version.clone(),
        set_values: old.set_values.clone(),
        set_value_templates: old.set_value_templates.clone(),
        wait: old.wait,
        image_strategy: old.image_strategy.clone(),
        ..Default::default()
    }
}

/// `/deploy/helm/releases/N/values[/...]` becomes `.../artifactOverrides[/...]`.
fn rename_release_values(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        ["", "deploy", "helm", "releases", index, "values", rest @ ..]
            if index.parse::<usize>().is_ok() =>
        {
            let mut renamed = format!("/deploy/helm/releases/{index}/artifactOverrides");
            for segment in rest {
                renamed.push('/');
                renamed.push_str(segment);
            }
            Some(renamed)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_release_values() {
        assert_eq!(
            rename_release_values("/deploy/helm/releases/0/values/image").as_deref(),
            Some("/deploy/helm/releases/0/artifactOverrides/image")
        );
        assert_eq!(
            rename_release_values("/deploy/helm/releases/12/values").as_deref(),
            Some("/deploy/helm/releases/12/artifactOverrides")
        );
        assert_eq!(rename_release_values("/deploy/helm/releases/0/valuesFiles"), None);
        assert_eq!(rename_release_values("/deploy/helm/releases/x/values"), None);
    }

    #[test]
    fn test_upgrade_renames_helm_values() {
        let config = parse(
            r#"
apiVersion: skaffold/v2alpha3
kind: Config
deploy:
  helm:
    releases:
    - name: app
      chartPath: charts/app
      values:
        image: gcr.io/project/app
"#,
        )
        .unwrap();

        let upgraded = config.upgrade(&mut Vec::new()).unwrap();
        let release = &upgraded.pipeline.deploy.helm.as_ref().unwrap().releases[0];
        assert_eq!(release.artifact_overrides["image"], "gcr.io/project/app");
        assert_eq!(release.chart_path, "charts/app");
    }

    #[test]
    fn test_artifact_types_are_exclusive() {
        let config = parse(
            r#"
apiVersion: skaffold/v2alpha3
kind: Config
build:
  artifacts:
  - image: app
  - image: both
    docker: {}
    jib: {}
"#,
        )
        .unwrap();

        let err = config.pipeline.validate("").unwrap_err();
        assert_eq!(
            err.to_string(),
            "/build/artifacts/1: only one of [docker, jib] can be set (oneOf=artifact)"
        );
    }

    #[test]
    fn test_upgrade_keeps_multiple_deployers() {
        let config = parse(
            r#"
apiVersion: skaffold/v2alpha3
kind: Config
deploy:
  kubeContext: minikube
  kubectl:
    manifests: [k8s/*.yaml]
  kustomize:
    paths: [base, overlays/dev]
"#,
        )
        .unwrap();

        let upgraded = config.upgrade(&mut Vec::new()).unwrap();
        let deploy = &upgraded.pipeline.deploy;
        assert_eq!(deploy.kube_context, "minikube");
        assert_eq!(
            deploy.kubectl.as_ref().unwrap().manifests,
            vec!["k8s/*.yaml".to_string()]
        );
        assert_eq!(
            deploy.kustomize.as_ref().unwrap().paths,
            vec!["base".to_string(), "overlays/dev".to_string()]
        );
    }
}
