//! Structured error types for configuration resolution.

use serde::Serialize;
use std::path::PathBuf;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed YAML, unknown fields, unknown version or kind.
    UnparseableDocument,
    /// A legacy feature with no forward mapping.
    UnsupportedMigration,
    /// Profile count mismatch, missing named profile, conflicting deployers,
    /// oneOf violations and duplicate image names.
    StructuralMismatch,
    /// A profile patch that cannot be applied.
    InvalidPatch,
    /// Environment or kubeconfig lookups.
    Environment,
    /// Reading or writing files.
    Io,
}

/// Errors raised while parsing, upgrading or resolving a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("parsing skaffold config: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("serializing skaffold config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("unknown field `{field}` in {context}")]
    UnknownField { context: String, field: String },

    #[error("missing `apiVersion` in skaffold config")]
    MissingVersion,

    #[error("unknown api version: {version:?} (known versions: {known})")]
    UnknownVersion { version: String, known: String },

    #[error("kind must be `Config`, found {0:?}")]
    InvalidKind(String),

    #[error(
        "converting {feature} from {version} isn't currently supported, please migrate this section manually"
    )]
    UnsupportedMigration {
        version: &'static str,
        feature: &'static str,
    },

    #[error(
        "can't merge {property} property from kustomize into kubectl deployer, property is already set with different value"
    )]
    IncompatibleDeployers { property: &'static str },

    #[error("profiles have different lengths: {old} != {new}")]
    ProfileCountMismatch { old: usize, new: usize },

    #[error("profile patch paths could not be migrated: {}", .0.join(", "))]
    UnmappedPatchPaths(Vec<String>),

    #[error("{path}: only one of [{}] can be set (oneOf={union})", .fields.join(", "))]
    OneOfViolation {
        path: String,
        union: &'static str,
        fields: Vec<&'static str>,
    },

    #[error(
        "duplicate image {image:?} found in sources {first} and {second}: artifact image names must be unique across all configurations"
    )]
    DuplicateImage {
        image: String,
        first: String,
        second: String,
    },

    #[error("couldn't find profile {0}")]
    ProfileNotFound(String),

    #[error("invalid path: {0}")]
    InvalidPatchPath(String),

    #[error("applying profile patches: {0}")]
    ApplyPatches(#[source] json_patch::PatchError),

    #[error("invalid env variable format: {0}, should be KEY=VALUE")]
    InvalidEnvActivation(String),

    #[error("getting current cluster context: {0}")]
    KubeContext(String),

    #[error(
        "profiles {profiles:?} were activated by kube-context {current:?}, but the effective kube-context is {effective:?} -- please revise your `profiles.activation` and `deploy.kubeContext` configurations"
    )]
    StaleKubeContext {
        profiles: Vec<String>,
        current: String,
        effective: String,
    },

    #[error("converting {context}: {source}")]
    Convert {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("parsing global config {}: {source}", .path.display())]
    GlobalConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Classify the error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Parse(_)
            | ConfigError::Serialize(_)
            | ConfigError::UnknownField { .. }
            | ConfigError::MissingVersion
            | ConfigError::UnknownVersion { .. }
            | ConfigError::InvalidKind(_) => ErrorCode::UnparseableDocument,
            ConfigError::UnsupportedMigration { .. } | ConfigError::UnmappedPatchPaths(_) => {
                ErrorCode::UnsupportedMigration
            }
            ConfigError::IncompatibleDeployers { .. }
            | ConfigError::ProfileCountMismatch { .. }
            | ConfigError::ProfileNotFound(_)
            | ConfigError::OneOfViolation { .. }
            | ConfigError::DuplicateImage { .. } => ErrorCode::StructuralMismatch,
            ConfigError::InvalidPatchPath(_)
            | ConfigError::ApplyPatches(_)
            | ConfigError::Convert { .. } => ErrorCode::InvalidPatch,
            ConfigError::InvalidEnvActivation(_)
            | ConfigError::KubeContext(_)
            | ConfigError::StaleKubeContext { .. } => ErrorCode::Environment,
            ConfigError::GlobalConfig { .. } | ConfigError::Io { .. } => ErrorCode::Io,
        }
    }

    pub(crate) fn convert(context: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| ConfigError::Convert { context, source }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
