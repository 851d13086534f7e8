//! Structural checks serde cannot express.
//!
//! - oneOf unions: at most one alternative of a [`OneOf`] struct may be set.
//! - artifact image names are unique across every document of a file.
//!
//! Locations are JSON pointers into the document, e.g. `/profiles/0/build`.

use super::upgrade::PipelineDocument;
use crate::error::{ConfigError, ConfigResult};
use std::collections::BTreeMap;

/// A struct whose fields are mutually exclusive alternatives.
pub trait OneOf {
    /// Union name, as in `oneOf=build`.
    fn union_name(&self) -> &'static str;

    /// Document names of the alternatives that are set.
    fn set_alternatives(&self) -> Vec<&'static str>;
}

/// Check every union reachable from a value located at `path`.
pub trait Validate {
    fn validate(&self, path: &str) -> ConfigResult<()>;
}

/// Fail when more than one alternative of `value` is set.
pub fn check_one_of<T: OneOf + ?Sized>(path: &str, value: &T) -> ConfigResult<()> {
    let set = value.set_alternatives();
    if set.len() > 1 {
        return Err(ConfigError::OneOfViolation {
            path: path.to_string(),
            union: value.union_name(),
            fields: set,
        });
    }
    Ok(())
}

/// Check each element of a list located at `path`.
pub fn check_each<T: Validate>(path: &str, items: &[T]) -> ConfigResult<()> {
    for (i, item) in items.iter().enumerate() {
        item.validate(&format!("{path}/{i}"))?;
    }
    Ok(())
}

/// Validate the main pipeline and every profile pipeline of a document.
pub fn validate_document<D>(document: &D) -> ConfigResult<()>
where
    D: PipelineDocument,
    D::Pipeline: Validate,
{
    document.pipeline().validate("")?;
    for (i, pipeline) in document.profile_pipelines().into_iter().enumerate() {
        pipeline.validate(&format!("/profiles/{i}"))?;
    }
    Ok(())
}

/// Fail on an image built by two artifacts.
///
/// `sources` pairs a document label with the images its artifacts build.
pub fn check_unique_images<'a, I, S>(sources: I) -> ConfigResult<()>
where
    I: IntoIterator<Item = (String, S)>,
    S: IntoIterator<Item = &'a str>,
{
    let mut seen: BTreeMap<&'a str, String> = BTreeMap::new();
    for (source, images) in sources {
        for image in images {
            if let Some(first) = seen.get(image) {
                return Err(ConfigError::DuplicateImage {
                    image: image.to_string(),
                    first: first.clone(),
                    second: source,
                });
            }
            seen.insert(image, source.clone());
        }
    }
    Ok(())
}

/// Implement [`OneOf`] for a struct from its alternative fields and their
/// document names. A field counts as set when it differs from its default.
macro_rules! one_of {
    ($ty:ty as $union:literal { $($alt:ident: $name:literal),+ $(,)? }) => {
        impl $crate::schema::validation::OneOf for $ty {
            fn union_name(&self) -> &'static str {
                $union
            }

            fn set_alternatives(&self) -> Vec<&'static str> {
                let mut set = Vec::new();
                $(
                    if !$crate::schema::util::is_default(&self.$alt) {
                        set.push($name);
                    }
                )+
                set
            }
        }
    };
}

pub(crate) use one_of;
