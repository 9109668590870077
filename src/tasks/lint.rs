//! Lint and package-install tasks.
//!
//! The lint engines (jscs, jshint) and the bower package manager are
//! external collaborators: these tasks only expand the file lists,
//! assemble the command line from the active settings, and shell out.
//! A missing binary is reported and tolerated; a nonzero exit fails the
//! task (and with it, anything that declared the lint as a dependency).

use crate::context::BuildContext;
use crate::graph::Task;
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// JS source globs handed to both lint engines.
const LINT_GLOBS: [&str; 2] = ["assets/js/front/**/*.js", "assets/js/app/**/*.js"];

/// Expand the lint globs under `src/`.
fn lint_targets(ctx: &BuildContext) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for pattern in LINT_GLOBS {
        let full = ctx.paths.src.join(pattern);
        if let Ok(paths) = glob::glob(&full.to_string_lossy()) {
            files.extend(paths.flatten().filter(|p| p.is_file()));
        }
    }
    files.sort();
    files
}

/// Run an external command, treating a failed spawn (binary not
/// installed) as a tolerated absence and a nonzero exit as a failure.
async fn run_external(name: &str, mut command: Command) -> Result<()> {
    debug!(tool = name, "Spawning external command");
    let status = match command.status().await {
        Ok(status) => status,
        Err(e) => {
            warn!(tool = name, error = %e, "External tool unavailable, skipping");
            return Ok(());
        }
    };
    if !status.success() {
        bail!("{} exited with {}", name, status);
    }
    Ok(())
}

/// `jscs` — code style check over the JS sources.
pub struct Jscs;

#[async_trait]
impl Task for Jscs {
    fn name(&self) -> &'static str {
        "jscs"
    }

    async fn run(&self, ctx: &BuildContext) -> Result<()> {
        if !ctx.settings.get_bool("lint.jscs.enabled", true) {
            info!(tool = "jscs", "Disabled in settings, skipping");
            return Ok(());
        }
        let files = lint_targets(ctx);
        if files.is_empty() {
            info!(tool = "jscs", "No JS sources to lint");
            return Ok(());
        }

        let program = ctx.settings.get_str("lint.jscs.command", "jscs").to_string();
        let mut command = Command::new(&program);
        let config = ctx.paths.config_dir.join(".jscsrc");
        if config.exists() {
            command.arg("--config").arg(&config);
        }
        command.args(&files);
        run_external("jscs", command).await
    }
}

/// `jshint` — static analysis over the JS sources.
///
/// In the production environment the verbose reporter is requested,
/// matching the stricter reporting the production pipeline uses.
pub struct Jshint;

#[async_trait]
impl Task for Jshint {
    fn name(&self) -> &'static str {
        "jshint"
    }

    async fn run(&self, ctx: &BuildContext) -> Result<()> {
        if !ctx.settings.get_bool("lint.jshint.enabled", true) {
            info!(tool = "jshint", "Disabled in settings, skipping");
            return Ok(());
        }
        let files = lint_targets(ctx);
        if files.is_empty() {
            info!(tool = "jshint", "No JS sources to lint");
            return Ok(());
        }

        let program = ctx
            .settings
            .get_str("lint.jshint.command", "jshint")
            .to_string();
        let mut command = Command::new(&program);
        let config = ctx.paths.config_dir.join(".jshintrc");
        if config.exists() {
            command.arg("--config").arg(&config);
        }
        if ctx.is_production() {
            command.arg("--verbose");
        }
        command.args(&files);
        run_external("jshint", command).await
    }
}

/// `bower` — install third-party front-end modules when a manifest is
/// present; a no-op otherwise.
pub struct Bower;

#[async_trait]
impl Task for Bower {
    fn name(&self) -> &'static str {
        "bower"
    }

    async fn run(&self, ctx: &BuildContext) -> Result<()> {
        if !ctx.paths.root.join("bower.json").exists() {
            debug!("No bower.json, skipping module install");
            return Ok(());
        }
        let program = ctx.settings.get_str("bower.command", "bower").to_string();
        let mut command = Command::new(&program);
        command.arg("install").current_dir(&ctx.paths.root);
        run_external("bower", command).await
    }
}
