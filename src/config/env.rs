//! Environment name resolution.
//!
//! Precedence chain, first existing source wins (no merging):
//! 1. Explicit CLI override (`--env`)
//! 2. First line of `./NODE_ENV`
//! 3. First line of `<config-dir>/.NODE_ENV`
//! 4. Compiled-in default (`test`)
//!
//! Each source is a strategy tried in turn; the resolution records which
//! one won so it can be logged and asserted on in tests.

use std::path::Path;
use tracing::debug;

/// Compiled-in default environment.
pub const DEFAULT_ENV: &str = "test";

/// Name of the root-level marker file.
const ROOT_MARKER: &str = "NODE_ENV";

/// Name of the config-directory marker file.
const CONFIG_MARKER: &str = ".NODE_ENV";

/// Which source in the precedence chain produced the environment name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvSource {
    /// Explicit `--env` flag.
    Flag,
    /// `NODE_ENV` marker file in the project root.
    RootMarker,
    /// `.NODE_ENV` marker file in the config directory.
    ConfigMarker,
    /// Compiled-in default.
    Default,
}

impl std::fmt::Display for EnvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvSource::Flag => write!(f, "--env flag"),
            EnvSource::RootMarker => write!(f, "NODE_ENV marker file"),
            EnvSource::ConfigMarker => write!(f, ".NODE_ENV marker file"),
            EnvSource::Default => write!(f, "built-in default"),
        }
    }
}

/// Result of environment resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvResolution {
    /// The resolved environment name, trimmed.
    pub name: String,
    /// The source that supplied it.
    pub source: EnvSource,
}

/// Resolve the active environment name.
///
/// Pure with respect to process state: the caller is responsible for
/// mirroring the result into the `NODE_ENV` process variable.
pub fn resolve_env(flag: Option<&str>, root: &Path, config_dir: &Path) -> EnvResolution {
    let sources: [(EnvSource, Option<String>); 4] = [
        (
            EnvSource::Flag,
            flag.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        ),
        (
            EnvSource::RootMarker,
            read_marker_line(&root.join(ROOT_MARKER)),
        ),
        (
            EnvSource::ConfigMarker,
            read_marker_line(&config_dir.join(CONFIG_MARKER)),
        ),
        (EnvSource::Default, Some(DEFAULT_ENV.to_string())),
    ];

    for (source, value) in sources {
        if let Some(name) = value {
            debug!(env = %name, source = %source, "Environment resolved");
            return EnvResolution { name, source };
        }
    }

    // The default source always yields a value.
    unreachable!("default environment source is infallible")
}

/// Read and trim the first line of a marker file.
///
/// Returns `None` when the file is absent, unreadable, or blank, so the
/// next source in the chain is consulted.
fn read_marker_line(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let line = content.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
