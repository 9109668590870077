//! Process-wide build context.
//!
//! Everything the tasks consume (resolved environment, settings, package
//! metadata, banner, project paths) is assembled here exactly once at
//! startup into one immutable struct and passed by `Arc` to every task.
//! There is no ambient global lookup and nothing is reloaded later.

use crate::banner::Banner;
use crate::config::{EnvResolution, Settings, resolve_env};
use crate::error::StartupResult;
use crate::manifest::{PackageMeta, read_marker};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fallback version identifier when `./VERSION` is absent.
const VERSION_FALLBACK: &str = "VERSION_UNKNOWN";

/// Fallback commit identifier when `./COMMIT` is absent.
const COMMIT_FALLBACK: &str = "COMMIT_UNKNOWN";

/// Default third-party module directory when `.bowerrc` is absent.
const DEFAULT_BOWER_DIR: &str = "bower_modules";

/// `.bowerrc` shape: only the module directory is consumed.
#[derive(Debug, Deserialize)]
struct BowerRc {
    #[serde(default)]
    directory: Option<String>,
}

/// Derived project directory layout.
///
/// Build and dist directories are versioned with the resolved version
/// string so parallel versions never clobber each other.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub config_dir: PathBuf,
    pub src: PathBuf,
    pub tmp: PathBuf,
    pub docs: PathBuf,
    pub build: PathBuf,
    pub dist: PathBuf,
    pub web: PathBuf,
    /// Third-party module directory from `.bowerrc`, or the default.
    pub bower: PathBuf,
}

impl ProjectPaths {
    fn derive(root: &Path, config_dir: &Path, version: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            config_dir: config_dir.to_path_buf(),
            src: root.join("src"),
            tmp: root.join("tmp"),
            docs: root.join("docs"),
            build: root.join(format!("build-{}", version)),
            dist: root.join(format!("dist-{}", version)),
            web: root.join("webroot"),
            bower: root.join(read_bower_dir(root)),
        }
    }
}

/// Read the module directory out of an optional `.bowerrc`.
fn read_bower_dir(root: &Path) -> String {
    let path = root.join(".bowerrc");
    let Ok(content) = std::fs::read_to_string(&path) else {
        return DEFAULT_BOWER_DIR.to_string();
    };
    match serde_json::from_str::<BowerRc>(&content) {
        Ok(rc) => rc
            .directory
            .unwrap_or_else(|| DEFAULT_BOWER_DIR.to_string()),
        Err(e) => {
            debug!("Ignoring malformed .bowerrc ({}): {}", path.display(), e);
            DEFAULT_BOWER_DIR.to_string()
        }
    }
}

/// Immutable startup state shared by all tasks.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Resolved environment name and the source that supplied it.
    pub env: EnvResolution,
    /// Settings loaded from `config/<env>.json`.
    pub settings: Settings,
    /// Package metadata with build timestamp/year augmentation.
    pub pkg: PackageMeta,
    /// Release version from `./VERSION`, or a fixed placeholder.
    pub version: String,
    /// Commit identifier from `./COMMIT`, or a fixed placeholder.
    pub commit: String,
    /// Rendered header/footer banner text.
    pub banner: Banner,
    /// Derived directory layout.
    pub paths: ProjectPaths,
}

impl BuildContext {
    /// Assemble the full context: resolve the environment, load settings
    /// and the manifest, render the banner, and derive project paths.
    pub fn initialize(
        root: &Path,
        config_dir: &Path,
        env_flag: Option<&str>,
    ) -> StartupResult<Self> {
        let env = resolve_env(env_flag, root, config_dir);
        info!(env = %env.name, source = %env.source, "Environment resolved");

        let settings = Settings::load(config_dir, &env.name)?;
        let pkg = PackageMeta::load(root)?;

        let version = read_marker(&root.join("VERSION"), VERSION_FALLBACK);
        let commit = read_marker(&root.join("COMMIT"), COMMIT_FALLBACK);

        let banner = Banner::render(config_dir, &pkg, &env.name, &version, &commit)?;
        let paths = ProjectPaths::derive(root, config_dir, &version);

        Ok(Self {
            env,
            settings,
            pkg,
            version,
            commit,
            banner,
            paths,
        })
    }

    /// Mirror the resolved environment name into the `NODE_ENV` process
    /// variable so downstream tooling spawned by tasks shares the value.
    ///
    /// Called once from the entry point, before any task executes.
    pub fn export_env(&self) {
        // SAFETY: invoked at startup before any other threads are
        // spawned, which is the requirement set_var carries in the 2024
        // edition.
        unsafe {
            std::env::set_var("NODE_ENV", &self.env.name);
        }
    }

    /// True when running in the production environment.
    pub fn is_production(&self) -> bool {
        self.env.name == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scaffold() -> TempDir {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join("config");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            r#"{"name": "site", "version": "1.0.0"}"#,
        )
        .unwrap();
        std::fs::write(config_dir.join("test.json"), r#"{"a": 1}"#).unwrap();
        temp
    }

    #[test]
    fn test_initialize_defaults_to_test_env() {
        let temp = scaffold();
        let config_dir = temp.path().join("config");
        let ctx = BuildContext::initialize(temp.path(), &config_dir, None).unwrap();

        assert_eq!(ctx.env.name, "test");
        assert_eq!(ctx.settings.get("a"), Some(&serde_json::json!(1)));
        assert_eq!(ctx.version, "VERSION_UNKNOWN");
        assert_eq!(ctx.commit, "COMMIT_UNKNOWN");
    }

    #[test]
    fn test_versioned_build_dirs() {
        let temp = scaffold();
        std::fs::write(temp.path().join("VERSION"), "2.0.1\n").unwrap();
        let config_dir = temp.path().join("config");
        let ctx = BuildContext::initialize(temp.path(), &config_dir, None).unwrap();

        assert!(ctx.paths.build.ends_with("build-2.0.1"));
        assert!(ctx.paths.dist.ends_with("dist-2.0.1"));
        assert!(ctx.paths.bower.ends_with("bower_modules"));
    }

    #[test]
    fn test_bowerrc_overrides_module_dir() {
        let temp = scaffold();
        std::fs::write(temp.path().join(".bowerrc"), r#"{"directory": "vendor"}"#).unwrap();
        let config_dir = temp.path().join("config");
        let ctx = BuildContext::initialize(temp.path(), &config_dir, None).unwrap();

        assert!(ctx.paths.bower.ends_with("vendor"));
    }

    #[test]
    fn test_missing_env_config_aborts() {
        let temp = scaffold();
        let config_dir = temp.path().join("config");
        let err = BuildContext::initialize(temp.path(), &config_dir, Some("production")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::StartupError::ConfigNotFound { .. }
        ));
    }

    #[test]
    fn test_initialize_twice_is_byte_identical() {
        let temp = scaffold();
        let config_dir = temp.path().join("config");
        let a = BuildContext::initialize(temp.path(), &config_dir, None).unwrap();
        let b = BuildContext::initialize(temp.path(), &config_dir, None).unwrap();

        assert_eq!(a.env, b.env);
        assert_eq!(a.settings.to_pretty_json(), b.settings.to_pretty_json());
        // The banner embeds the load timestamp; it is only byte-comparable
        // when both loads land in the same second.
        if a.pkg.built == b.pkg.built {
            assert_eq!(a.banner, b.banner);
        }
    }
}
