//! Version-independent upgrade machinery.
//!
//! - [`upgrade_pipelines`] applies one per-pipeline upgrade function to the
//!   main pipeline and to every profile's pipeline, in order.
//! - [`PathMigrations`] rewrites profile patch paths from one version's layout
//!   to the next, reporting paths it has no mapping for.

use super::util::JsonPatch;
use crate::error::{ConfigError, ConfigResult};
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// A document made of a main pipeline plus one pipeline per profile.
///
/// Both share the same type for a given schema version.
pub trait PipelineDocument {
    type Pipeline;

    fn pipeline(&self) -> &Self::Pipeline;

    fn pipeline_mut(&mut self) -> &mut Self::Pipeline;

    fn profile_pipelines(&self) -> Vec<&Self::Pipeline>;

    fn profile_pipelines_mut(&mut self) -> Vec<&mut Self::Pipeline>;
}

/// Run `upgrade_one` over the main pipeline, then over each profile pipeline.
///
/// Profiles upgrade 1:1 and keep their order, so differing profile counts
/// between `old` and `new` are an error.
pub fn upgrade_pipelines<Old, New, F>(old: &Old, new: &mut New, mut upgrade_one: F) -> ConfigResult<()>
where
    Old: PipelineDocument,
    New: PipelineDocument,
    F: FnMut(&Old::Pipeline, &mut New::Pipeline) -> ConfigResult<()>,
{
    upgrade_one(old.pipeline(), new.pipeline_mut())?;

    let old_profiles = old.profile_pipelines();
    let new_profiles = new.profile_pipelines_mut();
    if old_profiles.len() != new_profiles.len() {
        return Err(ConfigError::ProfileCountMismatch {
            old: old_profiles.len(),
            new: new_profiles.len(),
        });
    }

    for (old_pipeline, new_pipeline) in old_profiles.into_iter().zip(new_profiles) {
        upgrade_one(old_pipeline, new_pipeline)?;
    }
    Ok(())
}

/// A profile patch left untouched because its path has no mapping in the next version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationWarning {
    /// Version the patch was written against.
    pub from_version: &'static str,
    /// Version it was being upgraded to.
    pub to_version: &'static str,
    pub profile: String,
    pub path: String,
}

impl fmt::Display for MigrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "profile {:?}: patch path {} has no equivalent in {}, please migrate it manually",
            self.profile, self.path, self.to_version
        )
    }
}

/// Result of looking a patch path up in a [`PathMigrations`] table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMigration {
    Unchanged,
    Rewritten(String),
    Unmapped,
}

/// Static substitution table from one version's patch paths to the next.
#[derive(Debug, Clone, Copy)]
pub struct PathMigrations {
    pub from_version: &'static str,
    pub to_version: &'static str,
    /// Ordered `(old, new)` pointer fragments. The first match wins.
    pub renames: &'static [(&'static str, &'static str)],
    /// Fragments that changed shape with no automatic mapping.
    pub unmapped: &'static [&'static str],
}

impl PathMigrations {
    /// Look up the new location of `path`.
    pub fn migrate(&self, path: &str) -> PathMigration {
        for (old, new) in self.renames {
            if let Some(rewritten) = replace_segment(path, old, new) {
                return PathMigration::Rewritten(rewritten);
            }
        }
        if self
            .unmapped
            .iter()
            .any(|prefix| find_segment(path, prefix).is_some())
        {
            return PathMigration::Unmapped;
        }
        PathMigration::Unchanged
    }

    /// Rewrite every patch of a profile in place.
    ///
    /// Unmapped patches are left as they are and reported in `warnings`.
    pub fn migrate_patches(
        &self,
        profile: &str,
        patches: &mut [JsonPatch],
        warnings: &mut Vec<MigrationWarning>,
    ) {
        for patch in patches.iter_mut() {
            match self.migrate(&patch.path) {
                PathMigration::Unchanged => {}
                PathMigration::Rewritten(path) => patch.path = path,
                PathMigration::Unmapped => warnings.push(self.warning(profile, &patch.path)),
            }
        }
    }

    pub(crate) fn warning(&self, profile: &str, path: &str) -> MigrationWarning {
        let warning = MigrationWarning {
            from_version: self.from_version,
            to_version: self.to_version,
            profile: profile.to_string(),
            path: path.to_string(),
        };
        warn!("{}", warning);
        warning
    }
}

/// Byte offset of `fragment` in `path` where it covers whole pointer segments.
fn find_segment(path: &str, fragment: &str) -> Option<usize> {
    let mut search_from = 0;
    while let Some(pos) = path[search_from..].find(fragment) {
        let start = search_from + pos;
        let rest = &path[start + fragment.len()..];
        if rest.is_empty() || rest.starts_with('/') {
            return Some(start);
        }
        search_from = start + 1;
    }
    None
}

fn replace_segment(path: &str, old: &str, new: &str) -> Option<String> {
    let start = find_segment(path, old)?;
    Some(format!(
        "{}{}{}",
        &path[..start],
        new,
        &path[start + old.len()..]
    ))
}
