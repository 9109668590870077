//! webforge — build orchestrator for web front-end projects.
//!
//! Resolves the deployment environment, loads the matching configuration,
//! renders the artifact banner, and executes the requested task graph.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;
use webforge::cli::Cli;
use webforge::context::BuildContext;
use webforge::graph::{CancelToken, Scheduler};
use webforge::tasks;
use webforge::watch::{self, WatcherConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    // Startup state is assembled exactly once; any failure here is fatal
    // since every task depends on the resolved configuration and banner.
    let config_dir = cli.resolved_config_dir();
    let ctx = BuildContext::initialize(&cli.root, &config_dir, cli.env.as_deref())?;
    ctx.export_env();

    info!(
        "Starting webforge v{} ({} v{}, env: {})",
        env!("CARGO_PKG_VERSION"),
        ctx.pkg.manifest.name,
        ctx.pkg.manifest.version,
        ctx.env.name
    );

    let registry = Arc::new(tasks::registry());
    let scheduler = Scheduler::new(registry, Arc::new(ctx));

    // `default` and `watch` are dispatch points rather than graph nodes:
    // default selects a downstream task from the environment, watch runs
    // a persistent observer loop.
    let requested = cli.task.as_deref().unwrap_or("default");
    let target = if requested == "default" {
        let target = tasks::dispatch_for_env(&scheduler.context().env.name);
        info!(env = %scheduler.context().env.name, task = %target, "Environment dispatch");
        target.to_string()
    } else {
        requested.to_string()
    };

    if target == "watch" {
        let config = WatcherConfig {
            debounce: Duration::from_millis(cli.debounce_ms),
        };
        return watch::run_watch(scheduler, config).await;
    }

    scheduler.run(&target, CancelToken::never()).await
}
