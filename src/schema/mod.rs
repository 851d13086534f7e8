//! Versioned skaffold documents and the migration chain between them.
//!
//! Every supported version has its own module with its own types and an
//! `upgrade` step to the version right after it. [`SCHEMA_VERSIONS`] keeps them
//! in order, oldest first, and [`upgrade_to_latest`] walks the chain.

pub mod latest;
pub mod upgrade;
pub mod util;
pub mod v1beta13;
pub mod v2alpha3;
pub mod v2beta29;
pub mod validation;

pub use upgrade::MigrationWarning;

use crate::error::{ConfigError, ConfigResult};
use serde::Deserialize;
use tracing::debug;

/// A parsed document at whatever version it declared.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedDocument {
    V1Beta13(v1beta13::SkaffoldConfig),
    V2Alpha3(v2alpha3::SkaffoldConfig),
    V2Beta29(v2beta29::SkaffoldConfig),
    V4Beta1(latest::SkaffoldConfig),
}

impl VersionedDocument {
    pub fn api_version(&self) -> &'static str {
        match self {
            VersionedDocument::V1Beta13(_) => v1beta13::VERSION,
            VersionedDocument::V2Alpha3(_) => v2alpha3::VERSION,
            VersionedDocument::V2Beta29(_) => v2beta29::VERSION,
            VersionedDocument::V4Beta1(_) => latest::VERSION,
        }
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, VersionedDocument::V4Beta1(_))
    }

    /// Upgrade to the immediately following version. The latest version is
    /// returned unchanged.
    pub fn upgrade(self, warnings: &mut Vec<MigrationWarning>) -> ConfigResult<VersionedDocument> {
        Ok(match self {
            VersionedDocument::V1Beta13(config) => VersionedDocument::V2Alpha3(config.upgrade(warnings)?),
            VersionedDocument::V2Alpha3(config) => VersionedDocument::V2Beta29(config.upgrade(warnings)?),
            VersionedDocument::V2Beta29(config) => VersionedDocument::V4Beta1(config.upgrade(warnings)?),
            latest @ VersionedDocument::V4Beta1(_) => latest,
        })
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let yaml = match self {
            VersionedDocument::V1Beta13(config) => serde_yaml::to_string(config),
            VersionedDocument::V2Alpha3(config) => serde_yaml::to_string(config),
            VersionedDocument::V2Beta29(config) => serde_yaml::to_string(config),
            VersionedDocument::V4Beta1(config) => serde_yaml::to_string(config),
        };
        yaml.map_err(ConfigError::Serialize)
    }
}

/// One entry of the version registry.
#[derive(Clone, Copy)]
pub struct SchemaVersion {
    pub api_version: &'static str,
    parse: fn(serde_yaml::Value) -> ConfigResult<VersionedDocument>,
}

impl std::fmt::Debug for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaVersion")
            .field("api_version", &self.api_version)
            .finish()
    }
}

macro_rules! strict_parser {
    ($name:ident, $variant:ident, $config:ty) => {
        fn $name(value: serde_yaml::Value) -> ConfigResult<VersionedDocument> {
            let config: $config = util::from_value_strict(value)?;
            validation::validate_document(&config)?;
            Ok(VersionedDocument::$variant(config))
        }
    };
}

strict_parser!(parse_v1beta13, V1Beta13, v1beta13::SkaffoldConfig);
strict_parser!(parse_v2alpha3, V2Alpha3, v2alpha3::SkaffoldConfig);
strict_parser!(parse_v2beta29, V2Beta29, v2beta29::SkaffoldConfig);
strict_parser!(parse_latest, V4Beta1, latest::SkaffoldConfig);

/// Every known version, oldest first. The last entry is the latest.
pub static SCHEMA_VERSIONS: &[SchemaVersion] = &[
    SchemaVersion {
        api_version: v1beta13::VERSION,
        parse: parse_v1beta13,
    },
    SchemaVersion {
        api_version: v2alpha3::VERSION,
        parse: parse_v2alpha3,
    },
    SchemaVersion {
        api_version: v2beta29::VERSION,
        parse: parse_v2beta29,
    },
    SchemaVersion {
        api_version: latest::VERSION,
        parse: parse_latest,
    },
];

/// Look up a version in the registry.
pub fn schema_version(api_version: &str) -> Option<&'static SchemaVersion> {
    SCHEMA_VERSIONS
        .iter()
        .find(|version| version.api_version == api_version)
}

/// Just enough of a document to pick its schema.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentHeader {
    #[serde(default)]
    api_version: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

/// Parse a single document, detecting its version from `apiVersion`.
///
/// Unknown fields and oneOf violations in the document or its profiles are
/// errors.
pub fn parse(contents: &str) -> ConfigResult<VersionedDocument> {
    let value: serde_yaml::Value = serde_yaml::from_str(contents).map_err(ConfigError::Parse)?;
    parse_value(value)
}

/// Parse every document of a `---` separated stream. Empty documents are skipped.
pub fn parse_all(contents: &str) -> ConfigResult<Vec<VersionedDocument>> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(contents) {
        let value = serde_yaml::Value::deserialize(document).map_err(ConfigError::Parse)?;
        if value.is_null() {
            continue;
        }
        documents.push(parse_value(value)?);
    }
    Ok(documents)
}

fn parse_value(value: serde_yaml::Value) -> ConfigResult<VersionedDocument> {
    let header: DocumentHeader =
        serde_yaml::from_value(value.clone()).map_err(ConfigError::Parse)?;

    let api_version = header.api_version.ok_or(ConfigError::MissingVersion)?;
    let kind = header.kind.unwrap_or_default();
    if kind != util::CONFIG_KIND {
        return Err(ConfigError::InvalidKind(kind));
    }

    let schema = schema_version(&api_version).ok_or_else(|| ConfigError::UnknownVersion {
        version: api_version.clone(),
        known: SCHEMA_VERSIONS
            .iter()
            .map(|version| version.api_version)
            .collect::<Vec<_>>()
            .join(", "),
    })?;
    debug!(version = schema.api_version, "parsing skaffold config");
    (schema.parse)(value)
}

/// A document upgraded to the latest version.
#[derive(Debug, Clone)]
pub struct UpgradeOutcome {
    pub config: latest::SkaffoldConfig,
    /// Version the document was written in.
    pub source_version: &'static str,
    /// Profile patches that could not be migrated.
    pub warnings: Vec<MigrationWarning>,
}

/// Upgrade a document step by step until it reaches the latest version.
///
/// With `strict`, unmigrated profile patch paths are an error.
pub fn upgrade_to_latest(document: VersionedDocument, strict: bool) -> ConfigResult<UpgradeOutcome> {
    let source_version = document.api_version();
    let mut warnings = Vec::new();
    let mut document = document;

    while !document.is_latest() {
        let from = document.api_version();
        document = document.upgrade(&mut warnings)?;
        debug!(from, to = document.api_version(), "upgraded skaffold config");
    }

    if strict && !warnings.is_empty() {
        return Err(ConfigError::UnmappedPatchPaths(
            warnings.into_iter().map(|warning| warning.path).collect(),
        ));
    }

    match document {
        VersionedDocument::V4Beta1(config) => Ok(UpgradeOutcome {
            config,
            source_version,
            warnings,
        }),
        other => Err(ConfigError::UnknownVersion {
            version: other.api_version().to_string(),
            known: latest::VERSION.to_string(),
        }),
    }
}
