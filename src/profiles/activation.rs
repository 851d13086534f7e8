//! Decides which profiles are active.
//!
//! A profile is auto-activated when any of its `activation` entries matches
//! (all of them with `requiresAllActivations`). An entry matches when its
//! `env`, `kubeContext` and `command` criteria all hold; empty criteria hold
//! trivially. Explicit `--profile` names are layered on top.

use crate::config::{RunOptions, kubeconfig};
use crate::error::{ConfigError, ConfigResult};
use crate::schema::latest::Profile;
use crate::schema::util::Activation;
use regex_lite::Regex;
use std::cell::OnceCell;
use tracing::{debug, warn};

/// Outcome of profile selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivatedProfiles {
    /// Profile names in the order they are applied.
    pub activated: Vec<String>,
    /// Auto-activated profiles whose matching activation named a kube-context.
    pub context_specific: Vec<String>,
}

/// Evaluates activations against one set of [`RunOptions`].
///
/// The kubeconfig is read at most once, and only if an activation or the
/// consistency check needs it.
#[derive(Debug)]
pub struct ProfileActivator<'a> {
    options: &'a RunOptions,
    current_context: OnceCell<String>,
}

impl<'a> ProfileActivator<'a> {
    pub fn new(options: &'a RunOptions) -> Self {
        Self {
            options,
            current_context: OnceCell::new(),
        }
    }

    pub fn options(&self) -> &RunOptions {
        self.options
    }

    /// Select the active profiles among `profiles`.
    pub fn activated_profiles(&self, profiles: &[Profile]) -> ConfigResult<ActivatedProfiles> {
        let mut result = ActivatedProfiles::default();

        if self.options.profile_auto_activation {
            for profile in profiles {
                if let Some(context_specific) = self.is_profile_activated(profile)? {
                    debug!(profile = %profile.name, "profile auto-activated");
                    if context_specific {
                        result.context_specific.push(profile.name.clone());
                    }
                    push_unique(&mut result.activated, &profile.name);
                }
            }
        }

        for name in &self.options.profiles {
            match name.strip_prefix('-') {
                Some(disabled) => {
                    result.activated.retain(|active| active != disabled);
                    result.context_specific.retain(|active| active != disabled);
                }
                None => push_unique(&mut result.activated, name),
            }
        }
        Ok(result)
    }

    /// `Some(context_specific)` when the profile is activated.
    fn is_profile_activated(&self, profile: &Profile) -> ConfigResult<Option<bool>> {
        if profile.activation.is_empty() {
            return Ok(None);
        }

        let mut context_specific = false;
        for activation in &profile.activation {
            let matched = self.is_activated(activation)?;
            if matched {
                context_specific |= !activation.kube_context.is_empty();
                if !profile.requires_all_activations {
                    return Ok(Some(context_specific));
                }
            } else if profile.requires_all_activations {
                return Ok(None);
            }
        }
        Ok(profile.requires_all_activations.then_some(context_specific))
    }

    /// Whether every criterion of one activation holds.
    pub fn is_activated(&self, activation: &Activation) -> ConfigResult<bool> {
        Ok(self.is_env(&activation.env)?
            && is_command(&activation.command, &self.options.command)
            && self.is_kube_context(&activation.kube_context)?)
    }

    fn is_env(&self, env: &str) -> ConfigResult<bool> {
        if env.is_empty() {
            return Ok(true);
        }
        let Some((key, expected)) = env.split_once('=') else {
            return Err(ConfigError::InvalidEnvActivation(env.to_string()));
        };

        let actual = self.options.environment.get(key).unwrap_or_default();
        // An empty value would match anything as a regex
        if expected.is_empty() {
            return Ok(actual.is_empty());
        }
        Ok(regex_equal(expected, actual))
    }

    fn is_kube_context(&self, expected: &str) -> ConfigResult<bool> {
        if expected.is_empty() {
            return Ok(true);
        }
        Ok(regex_equal(expected, self.kube_context()?))
    }

    /// The `--kube-context` override, else the kubeconfig's current context.
    pub fn kube_context(&self) -> ConfigResult<&str> {
        match &self.options.kube_context {
            Some(context) if !context.is_empty() => Ok(context),
            _ => self.current_context(),
        }
    }

    /// The kubeconfig's current context, ignoring any override.
    pub fn current_context(&self) -> ConfigResult<&str> {
        if let Some(context) = self.current_context.get() {
            return Ok(context);
        }
        let context = kubeconfig::current_context(
            self.options.kubeconfig.as_deref(),
            &self.options.environment,
        )?;
        debug!(context = %context, "read current kube-context");
        Ok(self.current_context.get_or_init(|| context))
    }

    /// Fail when profiles were picked for one kube-context but the config
    /// deploys to another.
    pub fn check_kube_context_consistency(
        &self,
        context_specific: &[String],
        effective_context: &str,
    ) -> ConfigResult<()> {
        // The command line wins over deploy.kubeContext
        if self
            .options
            .kube_context
            .as_deref()
            .is_some_and(|context| !context.is_empty())
        {
            return Ok(());
        }
        if effective_context.is_empty() || context_specific.is_empty() {
            return Ok(());
        }

        let current = self.current_context()?;
        if effective_context == current {
            return Ok(());
        }
        Err(ConfigError::StaleKubeContext {
            profiles: context_specific.to_vec(),
            current: current.to_string(),
            effective: effective_context.to_string(),
        })
    }
}

/// Select the active profiles for `options`.
pub fn activated_profiles(profiles: &[Profile], options: &RunOptions) -> ConfigResult<ActivatedProfiles> {
    ProfileActivator::new(options).activated_profiles(profiles)
}

fn is_command(expected: &str, command: &str) -> bool {
    expected.is_empty() || regex_equal(expected, command)
}

/// Exact match, else unanchored regex match. A leading `!` negates.
///
/// An invalid regex never matches.
pub fn regex_equal(expected: &str, actual: &str) -> bool {
    match expected.strip_prefix('!') {
        Some(negated) => !regex_match(negated, actual),
        None => regex_match(expected, actual),
    }
}

fn regex_match(expected: &str, actual: &str) -> bool {
    if expected == actual {
        return true;
    }
    match Regex::new(expected) {
        Ok(regex) => regex.is_match(actual),
        Err(err) => {
            warn!(pattern = expected, error = %err, "invalid activation pattern");
            false
        }
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|existing| existing == name) {
        names.push(name.to_string());
    }
}
