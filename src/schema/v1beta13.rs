//! `skaffold/v1beta13`: the oldest supported schema.
//!
//! Deploy is a oneOf of helm, kubectl and kustomize, kustomize takes a single
//! `path`, and Jib artifacts come in two flavours (`jibMaven`, `jibGradle`).

use super::upgrade::{PathMigrations, upgrade_pipelines};
use super::util::{
    self, Activation, JsonPatch, Metadata, UnknownFields, clone_through_json, is_default,
    versioned_document,
};
use super::v2alpha3 as next;
use super::validation::{Validate, check_each, check_one_of, one_of};
use super::MigrationWarning;
use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const VERSION: &str = "skaffold/v1beta13";

/// Top-level document.
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

/// oneOf=tag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TagPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<GitTagger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<ShaTagger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_template: Option<EnvTemplateTagger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTimeTagger>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitTagger {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub variant: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShaTagger {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvTemplateTagger {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateTimeTagger {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timezone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LocalBuild {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push: Option<bool>,
    #[serde(default, rename = "useDockerCLI", skip_serializing_if = "is_default")]
    pub use_docker_cli: bool,
    #[serde(default, skip_serializing_if = "is_default")]
    pub use_buildkit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GoogleCloudBuild {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub disk_size_gb: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub machine_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timeout: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub docker_image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClusterDetails {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pull_secret_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timeout: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
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
    pub jib_maven: Option<JibMavenArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jib_gradle: Option<JibGradleArtifact>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DockerArtifact {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dockerfile: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub build_args: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cache_from: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BazelArtifact {
    pub target: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JibMavenArtifact {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub profile: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JibGradleArtifact {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TestCase {
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub structure_tests: Vec<String>,
}

/// oneOf=deploy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<HelmDeploy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubectl: Option<KubectlDeploy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kustomize: Option<KustomizeDeploy>,
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
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KubectlFlags {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apply: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<String>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub disable_validation: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KustomizeDeploy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "is_default")]
    pub flags: KubectlFlags,
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
#[serde(deny_unknown_fields)]
pub struct HelmDeployFlags {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub install: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upgrade: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HelmRelease {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chart_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values_files: Vec<String>,
    /// Image overrides, keyed by helm value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
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

/// oneOf=helmImageStrategy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HelmImageStrategy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqn: Option<HelmFqnConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<HelmConventionConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HelmFqnConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub property: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HelmConventionConfig {
    #[serde(default, skip_serializing_if = "is_default")]
    pub explicit_registry: bool,
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

one_of!(BuildConfig as "build" { local: "local", google_cloud_build: "googleCloudBuild", cluster: "cluster" });
one_of!(Artifact as "artifact" {
    docker: "docker",
    bazel: "bazel",
    jib_maven: "jibMaven",
    jib_gradle: "jibGradle",
});
one_of!(DeployConfig as "deploy" { helm: "helm", kubectl: "kubectl", kustomize: "kustomize" });
one_of!(HelmImageStrategy as "helmImageStrategy" { fqn: "fqn", helm: "helm" });

impl Validate for Artifact {
    fn validate(&self, path: &str) -> ConfigResult<()> {
        check_one_of(path, self)
    }
}

impl Validate for HelmRelease {
    fn validate(&self, path: &str) -> ConfigResult<()> {
        check_one_of(&format!("{path}/imageStrategy"), &self.image_strategy)
    }
}

impl Validate for Pipeline {
    fn validate(&self, path: &str) -> ConfigResult<()> {
        let build = format!("{path}/build");
        check_one_of(&build, &self.build)?;
        check_one_of(&format!("{build}/tagPolicy"), &self.build.tag_policy)?;
        check_each(&format!("{build}/artifacts"), &self.build.artifacts)?;

        let deploy = format!("{path}/deploy");
        check_one_of(&deploy, &self.deploy)?;
        if let Some(helm) = &self.deploy.helm {
            check_each(&format!("{deploy}/helm/releases"), &helm.releases)?;
        }
        Ok(())
    }
}

/// Parse a `skaffold/v1beta13` document, rejecting unknown fields.
pub fn parse(contents: &str) -> ConfigResult<SkaffoldConfig> {
    util::parse_strict(contents)
}

static PATCH_MIGRATIONS: PathMigrations = PathMigrations {
    from_version: VERSION,
    to_version: next::VERSION,
    renames: &[
        ("/deploy/kustomize/path", "/deploy/kustomize/paths/0"),
        ("/jibMaven/module", "/jib/project"),
        ("/jibMaven/args", "/jib/args"),
        ("/jibGradle/project", "/jib/project"),
        ("/jibGradle/args", "/jib/args"),
    ],
    unmapped: &["/jibMaven", "/jibGradle"],
};

impl SkaffoldConfig {
    /// Upgrade to `skaffold/v2alpha3`.
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
                    patches: profile.patches.clone(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        upgrade_pipelines(self, &mut new_config, upgrade_one_pipeline)?;

        for profile in &mut new_config.profiles {
            PATCH_MIGRATIONS.migrate_patches(&profile.name, &mut profile.patches, warnings);
        }
        Ok(new_config)
    }
}

fn upgrade_one_pipeline(old: &Pipeline, new: &mut next::Pipeline) -> ConfigResult<()> {
    new.build = next::BuildConfig {
        artifacts: old
            .build
            .artifacts
            .iter()
            .map(upgrade_artifact)
            .collect::<ConfigResult<_>>()?,
        insecure_registries: old.build.insecure_registries.clone(),
        tag_policy: clone_through_json(&old.build.tag_policy)?,
        local: clone_through_json(&old.build.local)?,
        google_cloud_build: clone_through_json(&old.build.google_cloud_build)?,
        cluster: clone_through_json(&old.build.cluster)?,
    };
    new.test = clone_through_json(&old.test)?;

    new.deploy.helm = clone_through_json(&old.deploy.helm)?;
    new.deploy.kubectl = clone_through_json(&old.deploy.kubectl)?;
    new.deploy.kustomize = old
        .deploy
        .kustomize
        .as_ref()
        .map(|kustomize| -> ConfigResult<_> {
            Ok(next::KustomizeDeploy {
                paths: if kustomize.path.is_empty() {
                    Vec::new()
                } else {
                    vec![kustomize.path.clone()]
                },
                flags: clone_through_json(&kustomize.flags)?,
            })
        })
        .transpose()?;
    Ok(())
}

fn upgrade_artifact(old: &Artifact) -> ConfigResult<next::Artifact> {
    let jib = match (&old.jib_maven, &old.jib_gradle) {
        (Some(maven), _) => {
            let mut args = maven.args.clone();
            if !maven.profile.is_empty() {
                args.push(format!("-P{}", maven.profile));
            }
            Some(next::JibArtifact {
                project: maven.module.clone(),
                args,
                builder_type: "maven".to_string(),
            })
        }
        (None, Some(gradle)) => Some(next::JibArtifact {
            project: gradle.project.clone(),
            args: gradle.args.clone(),
            builder_type: "gradle".to_string(),
        }),
        (None, None) => None,
    };

    Ok(next::Artifact {
        image: old.image.clone(),
        context: old.context.clone(),
        docker: clone_through_json(&old.docker)?,
        bazel: clone_through_json(&old.bazel)?,
        jib,
    })
}
