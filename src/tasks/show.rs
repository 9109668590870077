//! Diagnostic tasks: `show:config`, `show:src`, and `usage`.

use crate::context::BuildContext;
use crate::graph::Task;
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// `show:config` — print the resolved environment and active settings.
pub struct ShowConfig;

#[async_trait]
impl Task for ShowConfig {
    fn name(&self) -> &'static str {
        "show:config"
    }

    async fn run(&self, ctx: &BuildContext) -> Result<()> {
        println!("Environment: {} (from {})", ctx.env.name, ctx.env.source);
        println!("Version:     {}", ctx.version);
        println!("Commit:      {}", ctx.commit);
        println!("Config:");
        println!("{}", ctx.settings.to_pretty_json());
        Ok(())
    }
}

/// `show:src` — list source files newer than (or absent from) their
/// build-directory counterparts.
pub struct ShowSrc;

/// Collect source paths that would be copied by the next sync pass.
pub fn changed_sources(src: &Path, build: &Path) -> Result<Vec<PathBuf>> {
    let mut changed = Vec::new();
    if !src.exists() {
        return Ok(changed);
    }
    collect_changed(src, src, build, &mut changed)?;
    changed.sort();
    Ok(changed)
}

fn collect_changed(
    root: &Path,
    dir: &Path,
    build: &Path,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_changed(root, &path, build, out)?;
            continue;
        }
        let rel = path.strip_prefix(root).expect("entry under walk root");
        let counterpart = build.join(rel);
        let newer = match (path.metadata(), counterpart.metadata()) {
            (Ok(src_meta), Ok(dest_meta)) => match (src_meta.modified(), dest_meta.modified()) {
                (Ok(s), Ok(d)) => s > d,
                _ => true,
            },
            _ => true,
        };
        if newer {
            out.push(path);
        }
    }
    Ok(())
}

#[async_trait]
impl Task for ShowSrc {
    fn name(&self) -> &'static str {
        "show:src"
    }

    async fn run(&self, ctx: &BuildContext) -> Result<()> {
        let changed = changed_sources(&ctx.paths.src, &ctx.paths.build)?;
        if changed.is_empty() {
            println!("Source tree is in sync with {}", ctx.paths.build.display());
        } else {
            println!("Changed since last build:");
            for path in changed {
                println!("  {}", path.display());
            }
        }
        Ok(())
    }
}

/// `usage` — print invocation help with the project identity baked in.
pub struct Usage;

#[async_trait]
impl Task for Usage {
    fn name(&self) -> &'static str {
        "usage"
    }

    async fn run(&self, ctx: &BuildContext) -> Result<()> {
        println!(
            "{} v{} ({})",
            ctx.pkg.title(),
            ctx.pkg.manifest.version,
            ctx.env.name
        );
        println!();
        println!("Usage: webforge [TASK] [--env=<name>]");
        println!();
        println!("Common tasks:");
        println!("  build       install modules, sync sources, build assets");
        println!("  dist        stage the build tree into dist-<VERSION>");
        println!("  deploy      publish the build tree into webroot");
        println!("  clean       remove build-<VERSION> and dist-<VERSION>");
        println!("  lint        run jscs and jshint over the JS sources");
        println!("  test        lint plus configuration and source reports");
        println!("  watch       rebuild and deploy on source changes");
        println!("  usage       this message");
        println!();
        println!("Without a task, dispatch follows the resolved environment");
        println!("(test/dev/production; anything else prints this message).");
        Ok(())
    }
}
