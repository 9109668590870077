//! Asset build tasks.
//!
//! CSS and JS assets in the build directory get the rendered banner
//! stamped around their content; images are verified in place. These run
//! against the build tree after `sync:src2build` has populated it.

use crate::context::BuildContext;
use crate::graph::Task;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Collect files matching `pattern` relative to `base`.
fn collect(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = base.join(pattern);
    let full = full.to_string_lossy();
    let mut files = Vec::new();
    for entry in glob::glob(&full).with_context(|| format!("bad glob pattern {}", full))? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "Unreadable path while globbing"),
        }
    }
    files.sort();
    Ok(files)
}

/// Stamp the banner around a file's content, unless it already carries
/// this run's header (re-runs within one process are no-ops).
fn stamp_file(path: &Path, header: &str, footer: &str) -> Result<bool> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if content.starts_with(header) {
        return Ok(false);
    }
    let mut stamped = String::with_capacity(header.len() + content.len() + footer.len() + 2);
    stamped.push_str(header);
    stamped.push('\n');
    stamped.push_str(&content);
    stamped.push('\n');
    stamped.push_str(footer);
    std::fs::write(path, stamped).with_context(|| format!("writing {}", path.display()))?;
    Ok(true)
}

/// Stamp every file matching `pattern` under the build directory.
fn stamp_assets(ctx: &BuildContext, pattern: &str, kind: &str) -> Result<()> {
    let files = collect(&ctx.paths.build, pattern)?;
    let mut stamped = 0usize;
    for file in &files {
        if stamp_file(file, &ctx.banner.header, &ctx.banner.footer)? {
            stamped += 1;
        }
    }
    info!(kind, total = files.len(), stamped, "Assets processed");
    Ok(())
}

/// `build:css` — stamp banners onto CSS assets in the build tree.
pub struct BuildCss;

#[async_trait]
impl Task for BuildCss {
    fn name(&self) -> &'static str {
        "build:css"
    }

    async fn run(&self, ctx: &BuildContext) -> Result<()> {
        stamp_assets(ctx, "assets/css/**/*.css", "css")
    }
}

/// `build:js` — stamp banners onto JS assets in the build tree.
pub struct BuildJs;

#[async_trait]
impl Task for BuildJs {
    fn name(&self) -> &'static str {
        "build:js"
    }

    async fn run(&self, ctx: &BuildContext) -> Result<()> {
        stamp_assets(ctx, "assets/js/**/*.js", "js")
    }
}

/// `build:img` — verify image assets made it into the build tree.
/// Images are copied verbatim by the sync step; nothing is stamped.
pub struct BuildImg;

#[async_trait]
impl Task for BuildImg {
    fn name(&self) -> &'static str {
        "build:img"
    }

    async fn run(&self, ctx: &BuildContext) -> Result<()> {
        let files = collect(&ctx.paths.build, "assets/img/**/*")?;
        info!(kind = "img", total = files.len(), "Assets processed");
        Ok(())
    }
}

/// `populate` — make sure the working directory skeleton exists
/// (tmp and webroot), so downstream sync/deploy steps have targets.
pub struct Populate;

#[async_trait]
impl Task for Populate {
    fn name(&self) -> &'static str {
        "populate"
    }

    async fn run(&self, ctx: &BuildContext) -> Result<()> {
        for dir in [&ctx.paths.tmp, &ctx.paths.web] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        debug!("Directory skeleton ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stamp_wraps_content() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("app.css");
        std::fs::write(&file, "body{}").unwrap();

        let changed = stamp_file(&file, "/* head */", "/* foot */").unwrap();
        assert!(changed);
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "/* head */\nbody{}\n/* foot */"
        );
    }

    #[test]
    fn test_stamp_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("app.js");
        std::fs::write(&file, "var x;").unwrap();

        assert!(stamp_file(&file, "/* h */", "/* f */").unwrap());
        let once = std::fs::read_to_string(&file).unwrap();
        assert!(!stamp_file(&file, "/* h */", "/* f */").unwrap());
        assert_eq!(std::fs::read_to_string(&file).unwrap(), once);
    }

    #[test]
    fn test_collect_matches_nested_files() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("assets/css/vendor")).unwrap();
        std::fs::write(temp.path().join("assets/css/app.css"), "").unwrap();
        std::fs::write(temp.path().join("assets/css/vendor/lib.css"), "").unwrap();
        std::fs::write(temp.path().join("assets/css/notes.txt"), "").unwrap();

        let files = collect(temp.path(), "assets/css/**/*.css").unwrap();
        assert_eq!(files.len(), 2);
    }
}
