//! Package manifest loading.
//!
//! Reads `package.json` once at startup and augments it with a build
//! timestamp and build year. The result is immutable for the process
//! lifetime and feeds the banner renderer and the `usage` task.

use crate::error::{StartupError, StartupResult};
use serde::Deserialize;
use std::path::Path;

/// Author field of a package manifest. Real-world manifests use either
/// the structured object form or a single `"Name <email>"` string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Structured {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
    },
    Plain(String),
}

impl Author {
    /// Best-effort email extraction, used by the banner header template.
    pub fn email(&self) -> Option<&str> {
        match self {
            Author::Structured { email, .. } => email.as_deref(),
            Author::Plain(s) => {
                let start = s.find('<')?;
                let end = s.find('>')?;
                if end > start + 1 {
                    Some(&s[start + 1..end])
                } else {
                    None
                }
            }
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Author::Structured { name, .. } => name.as_deref(),
            Author::Plain(s) => Some(s.split('<').next().unwrap_or(s).trim()),
        }
    }
}

/// The subset of `package.json` the orchestrator consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
}

/// Package metadata plus startup-time augmentation.
///
/// `built` and `year` are captured once when the manifest is loaded so
/// that every artifact stamped during a single run carries an identical
/// timestamp.
#[derive(Debug, Clone)]
pub struct PackageMeta {
    pub manifest: PackageManifest,
    /// Local build timestamp, `YYYY-MM-DDTHH:MM:SS`.
    pub built: String,
    /// Four-digit build year.
    pub year: String,
}

impl PackageMeta {
    /// Load `package.json` from the project root.
    pub fn load(root: &Path) -> StartupResult<Self> {
        let path = root.join("package.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| StartupError::manifest_missing(&path, e))?;
        let manifest: PackageManifest = serde_json::from_str(&content)
            .map_err(|e| StartupError::manifest_missing(&path, e))?;
        Ok(Self::augment(manifest, chrono::Local::now().naive_local()))
    }

    fn augment(manifest: PackageManifest, now: chrono::NaiveDateTime) -> Self {
        Self {
            manifest,
            built: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
            year: now.format("%Y").to_string(),
        }
    }

    /// Display title, falling back to the package name.
    pub fn title(&self) -> &str {
        self.manifest.title.as_deref().unwrap_or(&self.manifest.name)
    }
}

/// Read the first line of an optional marker file (`VERSION`, `COMMIT`),
/// falling back to a fixed placeholder when the file is absent.
pub fn read_marker(path: &Path, fallback: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let line = content.lines().next().unwrap_or("").trim();
            if line.is_empty() {
                fallback.to_string()
            } else {
                line.to_string()
            }
        }
        Err(_) => fallback.to_string(),
    }
}
