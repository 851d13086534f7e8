//! Skaffold config schema versioning and profile resolution.
//!
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod profiles;
pub mod resolve;
pub mod schema;

pub use error::{ConfigError, ConfigResult, ErrorCode};
pub use resolve::{ResolvedConfig, ResolvedConfigs, resolve, resolve_file};
