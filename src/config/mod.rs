//! Environment-driven configuration.
//!
//! The active deployment environment is resolved once at startup from an
//! ordered chain of sources (CLI flag, marker files, compiled-in default),
//! and a matching `config/<env>.json` is loaded as the process-wide
//! settings object. Neither is ever reloaded.

mod env;
mod settings;

pub use env::{DEFAULT_ENV, EnvResolution, EnvSource, resolve_env};
pub use settings::Settings;
