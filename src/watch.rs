//! Source file watcher.
//!
//! Watches the CSS and JS asset trees under `src/` with a debounced
//! watcher and triggers the rebuild sequence for the kind of asset that
//! changed. Rapid repeated changes coalesce: every trigger supersedes the
//! in-flight sequence via the shared [`RunGeneration`], so stale runs
//! stop at the next task boundary instead of overlapping the new one.

use crate::graph::{RunGeneration, Scheduler};
use anyhow::{Result, bail};
use notify_debouncer_mini::{DebouncedEventKind, new_debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Rebuild sequence for a CSS change.
pub const CSS_SEQUENCE: [&str; 3] = ["sync:src2build", "build:css", "deploy"];

/// Rebuild sequence for a JS change.
pub const JS_SEQUENCE: [&str; 4] = ["populate", "sync:src2build", "build:js", "deploy"];

/// Kind of source change detected under `src/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceChange {
    Css(PathBuf),
    Js(PathBuf),
}

impl SourceChange {
    /// The task sequence this change triggers.
    pub fn sequence(&self) -> &'static [&'static str] {
        match self {
            SourceChange::Css(_) => &CSS_SEQUENCE,
            SourceChange::Js(_) => &JS_SEQUENCE,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SourceChange::Css(p) | SourceChange::Js(p) => p,
        }
    }
}

/// Watcher tuning.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce window for coalescing rapid file events.
    pub debounce: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
        }
    }
}

/// Handle to the running source watcher.
#[derive(Debug)]
pub struct SourceWatcherHandle {
    events: watch::Receiver<Option<SourceChange>>,
    _task_handle: tokio::task::JoinHandle<()>,
}

impl SourceWatcherHandle {
    /// Wait for the next source change. Returns `None` once the watcher
    /// has stopped.
    pub async fn wait_for_change(&mut self) -> Option<SourceChange> {
        loop {
            if self.events.changed().await.is_err() {
                return None;
            }
            let event = self.events.borrow_and_update().clone();
            if event.is_some() {
                return event;
            }
        }
    }
}

/// Start watching the asset trees under `src`.
///
/// Directories that do not exist are skipped with a warning; if neither
/// asset tree exists there is nothing to watch and this fails.
pub fn start_source_watcher(
    src: &Path,
    config: &WatcherConfig,
) -> Result<SourceWatcherHandle> {
    let css_dir = src.join("assets/css");
    let js_dir = src.join("assets/js");

    let (event_tx, event_rx) = watch::channel(None);
    let (notify_tx, notify_rx) = mpsc::channel();

    let mut debouncer = new_debouncer(config.debounce, notify_tx)?;
    let watcher = debouncer.watcher();

    let mut watching = 0usize;
    for dir in [&css_dir, &js_dir] {
        if dir.exists() {
            info!("Watching {}", dir.display());
            watcher.watch(dir, notify::RecursiveMode::Recursive)?;
            watching += 1;
        } else {
            warn!("Asset directory does not exist, skipping watch: {}", dir.display());
        }
    }
    if watching == 0 {
        bail!(
            "nothing to watch: neither {} nor {} exists",
            css_dir.display(),
            js_dir.display()
        );
    }

    let task_handle = tokio::task::spawn_blocking(move || {
        // Keep the debouncer alive for the lifetime of the task.
        let _debouncer = debouncer;
        forward_notify_events(notify_rx, event_tx, &css_dir, &js_dir);
    });

    Ok(SourceWatcherHandle {
        events: event_rx,
        _task_handle: task_handle,
    })
}

/// Forward debounced notify events into the tokio watch channel.
fn forward_notify_events(
    rx: mpsc::Receiver<Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>>,
    tx: watch::Sender<Option<SourceChange>>,
    css_dir: &Path,
    js_dir: &Path,
) {
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                for event in events {
                    if !matches!(
                        event.kind,
                        DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous
                    ) {
                        continue;
                    }
                    let Some(change) = classify_path(&event.path, css_dir, js_dir) else {
                        continue;
                    };
                    debug!(path = %change.path().display(), "Source change detected");
                    if tx.send(Some(change)).is_err() {
                        info!("Watch receiver dropped, stopping watcher");
                        return;
                    }
                }
            }
            Ok(Err(e)) => {
                error!("File watcher error: {}", e);
            }
            Err(_) => {
                info!("Watcher channel closed, stopping");
                return;
            }
        }
    }
}

/// Classify a changed path by the asset tree it belongs to.
fn classify_path(path: &Path, css_dir: &Path, js_dir: &Path) -> Option<SourceChange> {
    let extension = path.extension().and_then(|e| e.to_str());
    if path.starts_with(css_dir) && extension == Some("css") {
        return Some(SourceChange::Css(path.to_path_buf()));
    }
    if path.starts_with(js_dir) && extension == Some("js") {
        return Some(SourceChange::Js(path.to_path_buf()));
    }
    None
}

/// Run watch mode until the watcher stops.
///
/// Each detected change spawns its rebuild sequence with a fresh token
/// from `generation`, cancelling whatever sequence was still in flight.
pub async fn run_watch(scheduler: Scheduler, config: WatcherConfig) -> Result<()> {
    let src = scheduler.context().paths.src.clone();
    let mut handle = start_source_watcher(&src, &config)?;
    let generation = RunGeneration::new();

    info!("Watch mode active; waiting for changes");
    while let Some(change) = handle.wait_for_change().await {
        let sequence = change.sequence();
        info!(
            path = %change.path().display(),
            sequence = ?sequence,
            "Change detected, running sequence"
        );

        let token = generation.supersede();
        let sched = scheduler.clone();
        tokio::spawn(async move {
            if let Err(e) = sched.run_sequence(sequence, token).await {
                error!(error = %e, "Watch sequence failed");
            }
        });
    }

    info!("Watcher stopped");
    Ok(())
}
