//! Directory synchronization and clean tasks.
//!
//! Sync tasks mirror one directory tree into another, skipping files
//! whose destination is already at least as new as the source. Clean
//! tasks remove the versioned build/dist directories wholesale.

use crate::context::BuildContext;
use crate::graph::Task;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

/// Counters reported after a sync pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub copied: usize,
    pub skipped: usize,
}

/// Mirror `from` into `to`, creating directories as needed.
///
/// A file is copied when the destination is missing or older than the
/// source (mtime comparison, the same contract as the original
/// changed-file filter). Files present only in the destination are left
/// alone.
pub fn sync_dirs(from: &Path, to: &Path) -> Result<SyncStats> {
    let mut stats = SyncStats::default();
    if !from.exists() {
        debug!(from = %from.display(), "Sync source missing, nothing to do");
        return Ok(stats);
    }
    sync_recursive(from, to, &mut stats)?;
    Ok(stats)
}

fn sync_recursive(from: &Path, to: &Path, stats: &mut SyncStats) -> Result<()> {
    std::fs::create_dir_all(to)
        .with_context(|| format!("creating directory {}", to.display()))?;

    for entry in std::fs::read_dir(from)
        .with_context(|| format!("reading directory {}", from.display()))?
    {
        let entry = entry?;
        let src = entry.path();
        let dest = to.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            sync_recursive(&src, &dest, stats)?;
        } else if file_type.is_file() {
            if needs_copy(&src, &dest)? {
                std::fs::copy(&src, &dest)
                    .with_context(|| format!("copying {} -> {}", src.display(), dest.display()))?;
                stats.copied += 1;
            } else {
                stats.skipped += 1;
            }
        }
        // Symlinks and other special files are not part of the source tree.
    }
    Ok(())
}

/// Copy when the destination is missing or strictly older than the source.
fn needs_copy(src: &Path, dest: &Path) -> Result<bool> {
    let Ok(dest_meta) = std::fs::metadata(dest) else {
        return Ok(true);
    };
    let src_meta = std::fs::metadata(src)?;
    match (src_meta.modified(), dest_meta.modified()) {
        (Ok(src_mtime), Ok(dest_mtime)) => Ok(src_mtime > dest_mtime),
        // No mtime support on this filesystem: copy unconditionally.
        _ => Ok(true),
    }
}

/// Remove a directory tree if it exists.
fn remove_tree(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("removing {}", path.display()))?;
        info!(path = %path.display(), "Removed");
    } else {
        debug!(path = %path.display(), "Already clean");
    }
    Ok(())
}

macro_rules! sync_task {
    ($ty:ident, $name:literal, $from:ident, $to:ident) => {
        pub struct $ty;

        #[async_trait]
        impl Task for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            async fn run(&self, ctx: &BuildContext) -> Result<()> {
                let stats = sync_dirs(&ctx.paths.$from, &ctx.paths.$to)?;
                info!(
                    from = %ctx.paths.$from.display(),
                    to = %ctx.paths.$to.display(),
                    copied = stats.copied,
                    skipped = stats.skipped,
                    "Sync complete"
                );
                Ok(())
            }
        }
    };
}

sync_task!(SyncSrcToBuild, "sync:src2build", src, build);
sync_task!(SyncBuildToDist, "sync:build2dist", build, dist);
sync_task!(SyncBuildToWeb, "sync:build2web", build, web);

/// `clean:build` — remove the versioned build directory.
pub struct CleanBuild;

#[async_trait]
impl Task for CleanBuild {
    fn name(&self) -> &'static str {
        "clean:build"
    }

    async fn run(&self, ctx: &BuildContext) -> Result<()> {
        remove_tree(&ctx.paths.build)
    }
}

/// `clean:dist` — remove the versioned dist directory.
pub struct CleanDist;

#[async_trait]
impl Task for CleanDist {
    fn name(&self) -> &'static str {
        "clean:dist"
    }

    async fn run(&self, ctx: &BuildContext) -> Result<()> {
        remove_tree(&ctx.paths.dist)
    }
}
