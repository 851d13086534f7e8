//! Profile application: activation, overlay, then patches.

pub mod activation;
pub mod overlay;
pub mod patch;

pub use activation::{ActivatedProfiles, ProfileActivator, activated_profiles, regex_equal};
pub use overlay::Overlay;
pub use patch::apply_patches;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::latest::{Profile, SkaffoldConfig};
use crate::schema::util::check_unknown_fields;
use tracing::debug;

/// Apply the profiles `activator` selects to `config`, returning their names.
///
/// The profile list is removed from `config`. Selected profiles the config
/// does not define are skipped; callers resolving several configs check that
/// each requested profile exists in at least one of them.
pub fn apply_profiles(
    config: &mut SkaffoldConfig,
    activator: &ProfileActivator<'_>,
) -> ConfigResult<Vec<String>> {
    let profiles = std::mem::take(&mut config.profiles);
    let ActivatedProfiles {
        activated,
        context_specific,
    } = activator.activated_profiles(&profiles)?;

    let mut applied = Vec::new();
    for name in activated {
        let Some(profile) = profiles.iter().find(|profile| profile.name == name) else {
            debug!(profile = %name, "profile not defined in this config");
            continue;
        };
        apply_profile(config, profile.clone())?;
        applied.push(name);
    }

    activator.check_kube_context_consistency(&context_specific, &config.pipeline.deploy.kube_context)?;
    Ok(applied)
}

/// Overlay one profile's pipeline onto `config`, then apply its patches.
pub fn apply_profile(config: &mut SkaffoldConfig, profile: Profile) -> ConfigResult<()> {
    debug!(profile = %profile.name, patches = profile.patches.len(), "applying profile");
    config.pipeline.overlay(profile.pipeline);

    if profile.patches.is_empty() {
        return Ok(());
    }

    let mut document =
        serde_json::to_value(&*config).map_err(ConfigError::convert("config for patching"))?;
    apply_patches(&mut document, &profile.patches)?;

    let patched: SkaffoldConfig =
        serde_json::from_value(document).map_err(ConfigError::convert("patched config"))?;
    check_unknown_fields(&patched)?;
    *config = patched;
    Ok(())
}
