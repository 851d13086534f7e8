//! Tool configuration: run options, environment, kubeconfig and the global config file.
//!
//! ## Global config
//! Settings come from three tiers, overlaid field by field:
//! 1. **Defaults** - empty
//! 2. **Global** - the `global` section of `~/.skaffold/config`
//! 3. **Kube-context** - the `kubeContexts` entry matching the active context
//!
//! ## Environment Variables
//! - `SKAFFOLD_GLOBAL_CONFIG` - Global config file (default: `~/.skaffold/config`)
//! - `KUBECONFIG` - Kubeconfig files; the first one is read (default: `~/.kube/config`)

mod environment;
pub mod kubeconfig;
mod loader;
mod options;
mod types;

pub use environment::Environment;
pub use loader::{ConfigLoader, ConfigPaths};
pub use options::RunOptions;
pub use types::{ContextConfig, GlobalConfig};
