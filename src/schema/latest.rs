//! `skaffold/v4beta1`, the latest schema and the shape every document resolves to.
//!
//! Manifests are declared once under `manifests` and consumed by the deployers
//! under `deploy`.

use super::util::{self, Activation, JsonPatch, Metadata, UnknownFields, is_default, versioned_document};
use super::validation::{Validate, check_each, check_one_of, one_of};
use crate::error::ConfigResult;
use crate::profiles::overlay::{overlay_one_of, overlay_struct};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use super::v2beta29::{
    Artifact, BazelArtifact, BuildConfig, ClusterDetails, DateTimeTagger, DockerArtifact,
    EnvTemplateTagger, GitTagger, GoogleCloudBuild, HelmDeployFlags, JibArtifact, KubectlFlags,
    LocalBuild, ShaTagger, TagPolicy, TestCase,
};

pub const VERSION: &str = "skaffold/v4beta1";

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

/// Build, test, render and deploy stanzas shared by the document and its profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default, skip_serializing_if = "is_default")]
    pub build: BuildConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test: Vec<TestCase>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub manifests: RenderConfig,
    #[serde(default, skip_serializing_if = "is_default")]
    pub deploy: DeployConfig,
}

/// Where manifests come from and how they are hydrated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenderConfig {
    /// Plain manifest globs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw_yaml: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kustomize: Option<Kustomize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<Helm>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Kustomize {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub build_args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Helm {
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
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_values: BTreeMap<String, String>,
    /// Values rendered from image templates such as `{{.IMAGE_FULLY_QUALIFIED_app}}`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_value_templates: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub wait: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeployConfig {
    /// Deploys the releases rendered under `manifests.helm`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<LegacyHelmDeploy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubectl: Option<KubectlDeploy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_check: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kube_context: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyHelmDeploy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub releases: Vec<HelmRelease>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub flags: HelmDeployFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KubectlDeploy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_manifests: Vec<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub flags: KubectlFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activation: Vec<Activation>,
    /// Every activation must match instead of any one of them.
    #[serde(default, skip_serializing_if = "is_default")]
    pub requires_all_activations: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<JsonPatch>,
    #[serde(flatten)]
    pub pipeline: Pipeline,
    #[serde(default, flatten)]
    pub unknown_fields: UnknownFields,
}

versioned_document!(SkaffoldConfig, Pipeline);

overlay_struct!(Pipeline { build, test, manifests, deploy });
overlay_struct!(BuildConfig { artifacts, insecure_registries, tag_policy }
    one_of "build" { local: "local", google_cloud_build: "googleCloudBuild", cluster: "cluster" });
overlay_one_of!(TagPolicy as "tag" {
    git_commit: "gitCommit",
    sha256: "sha256",
    env_template: "envTemplate",
    date_time: "dateTime",
});
overlay_struct!(RenderConfig { raw_yaml, kustomize, helm });
overlay_struct!(DeployConfig { helm, kubectl, status_check, kube_context });

one_of!(HelmRelease as "chartSource" { chart_path: "chartPath", remote_chart: "remoteChart" });

impl Validate for HelmRelease {
    fn validate(&self, path: &str) -> ConfigResult<()> {
        check_one_of(path, self)
    }
}

impl Validate for Pipeline {
    fn validate(&self, path: &str) -> ConfigResult<()> {
        self.build.validate(&format!("{path}/build"))?;
        if let Some(helm) = &self.manifests.helm {
            check_each(&format!("{path}/manifests/helm/releases"), &helm.releases)?;
        }
        if let Some(helm) = &self.deploy.helm {
            check_each(&format!("{path}/deploy/helm/releases"), &helm.releases)?;
        }
        Ok(())
    }
}

/// Parse a `skaffold/v4beta1` document, rejecting unknown fields.
pub fn parse(contents: &str) -> ConfigResult<SkaffoldConfig> {
    util::parse_strict(contents)
}

impl SkaffoldConfig {
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::overlay::Overlay;

    #[test]
    fn test_parse_latest() {
        let config = parse(
            r#"
apiVersion: skaffold/v4beta1
kind: Config
metadata:
  name: app
build:
  artifacts:
  - image: app
  tagPolicy:
    sha256: {}
manifests:
  rawYaml: [k8s/*.yaml]
deploy:
  kubectl: {}
profiles:
- name: gcb
  requiresAllActivations: true
  build:
    googleCloudBuild:
      projectId: my-project
"#,
        )
        .unwrap();

        assert_eq!(config.metadata.name, "app");
        assert!(config.pipeline.build.tag_policy.sha256.is_some());
        assert_eq!(config.pipeline.manifests.raw_yaml, vec!["k8s/*.yaml".to_string()]);
        let profile = config.profile("gcb").unwrap();
        assert!(profile.requires_all_activations);
        assert!(profile.pipeline.build.google_cloud_build.is_some());
    }

    #[test]
    fn test_profile_unknown_field_is_rejected() {
        let err = parse(
            r#"
apiVersion: skaffold/v4beta1
kind: Config
profiles:
- name: dev
  deployy: {}
"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown field `deployy` in profiles[0]"
        );
    }

    #[test]
    fn test_build_type_overlay_is_exclusive() {
        let mut base = BuildConfig {
            local: Some(LocalBuild {
                push: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        base.overlay(BuildConfig {
            google_cloud_build: Some(GoogleCloudBuild {
                project_id: "p".into(),
                ..Default::default()
            }),
            ..Default::default()
        });

        assert!(base.local.is_none());
        assert_eq!(base.google_cloud_build.unwrap().project_id, "p");
    }

    #[test]
    fn test_tag_policy_overlay() {
        let mut base = TagPolicy {
            git_commit: Some(GitTagger::default()),
            ..Default::default()
        };
        base.overlay(TagPolicy::default());
        assert!(base.git_commit.is_some());

        base.overlay(TagPolicy {
            sha256: Some(ShaTagger {}),
            ..Default::default()
        });
        assert!(base.git_commit.is_none());
        assert!(base.sha256.is_some());
    }

    #[test]
    fn test_serialization_omits_empty_sections() {
        let config = SkaffoldConfig {
            api_version: VERSION.to_string(),
            kind: "Config".to_string(),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert_eq!(yaml, "apiVersion: skaffold/v4beta1\nkind: Config\n");
    }
}
