//! Types and helpers shared by every schema version.

use crate::error::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys a document or profile carried that its schema does not know.
///
/// Collected through `#[serde(flatten)]` next to the inline pipeline, because
/// `deny_unknown_fields` cannot be combined with flattening.
pub type UnknownFields = BTreeMap<String, serde_yaml::Value>;

/// Kind every skaffold document must declare.
pub const CONFIG_KIND: &str = "Config";

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    /// Identifier of the config.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

/// One RFC 6902-like operation declared by a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonPatch {
    /// One of `add`, `remove`, `replace`, `move`, `copy` or `test`.
    /// Defaults to `replace`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub op: String,

    /// Slash-delimited pointer into the serialized config.
    #[serde(default)]
    pub path: String,

    /// Source pointer for `move` and `copy`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from: String,

    /// Embedded YAML fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Criteria that auto-activate a profile. All set criteria must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Activation {
    /// `KEY=VALUE` where VALUE is matched as a regex against the variable.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub env: String,

    /// Regex matched against the active kube context.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kube_context: String,

    /// Regex matched against the running command (`dev`, `run`, ...).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
}

/// Implemented by every versioned document so parsing can reject unknown keys.
pub trait StrictDocument {
    /// Each unknown-field bucket with the location it belongs to.
    fn unknown_fields(&self) -> Vec<(String, &UnknownFields)>;
}

/// Parse a single YAML document, rejecting unknown fields.
pub fn parse_strict<T>(contents: &str) -> ConfigResult<T>
where
    T: DeserializeOwned + StrictDocument,
{
    let document: T = serde_yaml::from_str(contents).map_err(ConfigError::Parse)?;
    check_unknown_fields(&document)?;
    Ok(document)
}

/// Same as [`parse_strict`] for an already split YAML value.
pub fn from_value_strict<T>(value: serde_yaml::Value) -> ConfigResult<T>
where
    T: DeserializeOwned + StrictDocument,
{
    let document: T = serde_yaml::from_value(value).map_err(ConfigError::Parse)?;
    check_unknown_fields(&document)?;
    Ok(document)
}

/// Fail on the first unknown field of `document`.
pub fn check_unknown_fields<T: StrictDocument>(document: &T) -> ConfigResult<()> {
    for (context, fields) in document.unknown_fields() {
        if let Some(field) = fields.keys().next() {
            return Err(ConfigError::UnknownField {
                context,
                field: field.clone(),
            });
        }
    }
    Ok(())
}

/// Deep copy between two structurally identical types through `serde_json`.
///
/// Used by upgrades for sub-trees that did not change between versions.
pub fn clone_through_json<T, U>(from: &T) -> ConfigResult<U>
where
    T: Serialize,
    U: DeserializeOwned,
{
    let value = serde_json::to_value(from).map_err(ConfigError::convert("serializing"))?;
    serde_json::from_value(value).map_err(ConfigError::convert("deserializing"))
}

/// Replace characters that are illegal in helm template identifiers.
pub fn sanitize_helm_template_value(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '.' | '-' | '/' | ':' | '@' => '_',
            c => c,
        })
        .collect()
}

pub(crate) fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Implement [`StrictDocument`] and [`PipelineDocument`](super::upgrade::PipelineDocument)
/// for a version's `SkaffoldConfig`, which must have `pipeline`, `profiles`
/// and `unknown_fields` fields, with profiles carrying `pipeline` and `unknown_fields`.
macro_rules! versioned_document {
    ($config:ty, $pipeline:ty) => {
        impl $crate::schema::util::StrictDocument for $config {
            fn unknown_fields(&self) -> Vec<(String, &$crate::schema::util::UnknownFields)> {
                let mut fields = vec![("config".to_string(), &self.unknown_fields)];
                for (i, profile) in self.profiles.iter().enumerate() {
                    fields.push((format!("profiles[{i}]"), &profile.unknown_fields));
                }
                fields
            }
        }

        impl $crate::schema::upgrade::PipelineDocument for $config {
            type Pipeline = $pipeline;

            fn pipeline(&self) -> &$pipeline {
                &self.pipeline
            }

            fn pipeline_mut(&mut self) -> &mut $pipeline {
                &mut self.pipeline
            }

            fn profile_pipelines(&self) -> Vec<&$pipeline> {
                self.profiles.iter().map(|p| &p.pipeline).collect()
            }

            fn profile_pipelines_mut(&mut self) -> Vec<&mut $pipeline> {
                self.profiles.iter_mut().map(|p| &mut p.pipeline).collect()
            }
        }
    };
}

pub(crate) use versioned_document;
