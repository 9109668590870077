//! CLI definition.
//!
//! Invocation mirrors the task-runner convention: `webforge <taskname>`,
//! with the environment override consumed before any task executes.

use clap::Parser;
use std::path::PathBuf;

/// Build orchestrator for web front-end projects
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Task to run; without one, dispatch follows the resolved environment
    pub task: Option<String>,

    /// Environment override (takes precedence over marker files)
    #[arg(short, long)]
    pub env: Option<String>,

    /// Project root directory
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration directory, relative to the project root unless absolute
    #[arg(short, long, default_value = "config")]
    pub config_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: String,

    /// Debounce window in milliseconds for watch mode
    #[arg(long, default_value_t = 500)]
    pub debounce_ms: u64,
}

impl Cli {
    /// The configuration directory resolved against the project root.
    pub fn resolved_config_dir(&self) -> PathBuf {
        if self.config_dir.is_absolute() {
            self.config_dir.clone()
        } else {
            self.root.join(&self.config_dir)
        }
    }
}
