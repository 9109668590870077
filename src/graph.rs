//! Task graph and scheduler.
//!
//! Named tasks form a static DAG: `deps` run before a task's body and
//! independent deps run concurrently; `stages` run strictly after the
//! body, one at a time. The graph is validated (unknown names, cycles)
//! before anything executes, and each task runs at most once per run even
//! when several tasks depend on it.
//!
//! A [`CancelToken`] threads through every run. Watch mode supersedes the
//! in-flight sequence by issuing a fresh token from the shared
//! [`RunGeneration`]; the scheduler checks the token between tasks and
//! stops early instead of letting stale runs overlap the new one.

use crate::context::BuildContext;
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// A named build operation.
///
/// Pure composition tasks implement only `deps`/`stages`; leaf tasks
/// implement `run`.
#[async_trait]
pub trait Task: Send + Sync {
    /// Unique task name, e.g. `build:css`.
    fn name(&self) -> &'static str;

    /// Dependencies executed (concurrently) before the body.
    fn deps(&self) -> &[&'static str] {
        &[]
    }

    /// Tasks executed sequentially after the body completes.
    fn stages(&self) -> &[&'static str] {
        &[]
    }

    /// The task body. Defaults to a no-op for composition-only tasks.
    async fn run(&self, _ctx: &BuildContext) -> Result<()> {
        Ok(())
    }
}

/// A task that is nothing but composition: parallel deps, then an
/// ordered list of follow-up stages.
pub struct CompositeTask {
    name: &'static str,
    deps: Vec<&'static str>,
    stages: Vec<&'static str>,
}

impl CompositeTask {
    pub fn new(name: &'static str, deps: Vec<&'static str>) -> Self {
        Self {
            name,
            deps,
            stages: Vec::new(),
        }
    }

    pub fn with_stages(mut self, stages: Vec<&'static str>) -> Self {
        self.stages = stages;
        self
    }
}

#[async_trait]
impl Task for CompositeTask {
    fn name(&self) -> &'static str {
        self.name
    }

    fn deps(&self) -> &[&'static str] {
        &self.deps
    }

    fn stages(&self) -> &[&'static str] {
        &self.stages
    }
}

/// Registry of all named tasks.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<&'static str, Arc<dyn Task>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Last registration wins for duplicate names.
    pub fn register(&mut self, task: impl Task + 'static) {
        self.tasks.insert(task.name(), Arc::new(task));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Task>> {
        self.tasks.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// All task names, sorted for stable display.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.tasks.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Issues cancellation tokens for successive runs.
///
/// Each `supersede` call invalidates every previously issued token.
#[derive(Debug, Clone, Default)]
pub struct RunGeneration {
    counter: Arc<AtomicU64>,
}

impl RunGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for a new run, cancelling all earlier ones.
    pub fn supersede(&self) -> CancelToken {
        let issued = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        CancelToken {
            current: Arc::clone(&self.counter),
            issued,
        }
    }
}

/// Cancellation token carried by a single graph run.
#[derive(Debug, Clone)]
pub struct CancelToken {
    current: Arc<AtomicU64>,
    issued: u64,
}

impl CancelToken {
    /// A token that can never be cancelled, for one-shot runs.
    pub fn never() -> Self {
        Self {
            current: Arc::new(AtomicU64::new(0)),
            issued: 0,
        }
    }

    /// True once a later run has superseded this one.
    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.issued
    }
}

/// Outcome of one task within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    /// The body (or a sequential stage) returned an error.
    Failed,
    /// Not executed because a dependency failed.
    Skipped,
    /// Not executed (or stopped between stages) because the run was
    /// superseded.
    Cancelled,
}

/// Per-run completion tracking.
///
/// The first caller to reach a task becomes its owner and executes it;
/// every later caller awaits the owner's broadcast outcome. This is what
/// coalesces diamond dependencies.
struct RunState {
    slots: std::sync::Mutex<HashMap<String, watch::Receiver<Option<TaskOutcome>>>>,
}

enum Slot {
    Owner(watch::Sender<Option<TaskOutcome>>),
    Waiter(watch::Receiver<Option<TaskOutcome>>),
}

type OutcomeFuture = Pin<Box<dyn Future<Output = TaskOutcome> + Send>>;

/// Executes task graphs against an immutable build context.
#[derive(Clone)]
pub struct Scheduler {
    registry: Arc<TaskRegistry>,
    ctx: Arc<BuildContext>,
}

impl Scheduler {
    pub fn new(registry: Arc<TaskRegistry>, ctx: Arc<BuildContext>) -> Self {
        Self { registry, ctx }
    }

    pub fn context(&self) -> &Arc<BuildContext> {
        &self.ctx
    }

    /// Run a single named task and everything it depends on.
    ///
    /// Cancellation is not an error: a superseded run returns `Ok` after
    /// logging, since the replacement run owns the outcome from there on.
    pub async fn run(&self, target: &str, cancel: CancelToken) -> Result<()> {
        self.validate(target)?;

        let state = Arc::new(RunState {
            slots: std::sync::Mutex::new(HashMap::new()),
        });

        match self.run_task(target.to_string(), state, cancel).await {
            TaskOutcome::Succeeded => Ok(()),
            TaskOutcome::Cancelled => {
                info!(task = %target, "Run superseded, stopping early");
                Ok(())
            }
            TaskOutcome::Failed | TaskOutcome::Skipped => {
                bail!("task '{}' failed", target)
            }
        }
    }

    /// Run a list of tasks strictly in order, stopping at the first
    /// failure or when the run is superseded.
    pub async fn run_sequence(&self, targets: &[&str], cancel: CancelToken) -> Result<()> {
        for target in targets {
            if cancel.is_cancelled() {
                info!(task = %target, "Sequence superseded, stopping early");
                return Ok(());
            }
            self.run(target, cancel.clone()).await?;
        }
        Ok(())
    }

    /// Check that `target` and its whole closure exist and are acyclic.
    pub fn validate(&self, target: &str) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            InProgress,
            Done,
        }

        fn visit(
            registry: &TaskRegistry,
            name: &str,
            required_by: &str,
            colors: &mut HashMap<String, Color>,
            path: &mut Vec<String>,
        ) -> Result<()> {
            match colors.get(name) {
                Some(Color::Done) => return Ok(()),
                Some(Color::InProgress) => {
                    bail!(
                        "dependency cycle: {} -> {}",
                        path.join(" -> "),
                        name
                    );
                }
                None => {}
            }

            let Some(task) = registry.get(name) else {
                bail!("unknown task '{}' (required by '{}')", name, required_by);
            };

            colors.insert(name.to_string(), Color::InProgress);
            path.push(name.to_string());
            for next in task.deps().iter().chain(task.stages()) {
                visit(registry, next, name, colors, path)?;
            }
            path.pop();
            colors.insert(name.to_string(), Color::Done);
            Ok(())
        }

        let mut colors = HashMap::new();
        let mut path = Vec::new();
        visit(&self.registry, target, "<cli>", &mut colors, &mut path)
    }

    /// Execute one task, deduplicated across the run.
    fn run_task(&self, name: String, state: Arc<RunState>, cancel: CancelToken) -> OutcomeFuture {
        let this = self.clone();
        Box::pin(async move {
            let slot = {
                let mut slots = state.slots.lock().expect("run state lock poisoned");
                if let Some(rx) = slots.get(&name) {
                    Slot::Waiter(rx.clone())
                } else {
                    let (tx, rx) = watch::channel(None);
                    slots.insert(name.clone(), rx);
                    Slot::Owner(tx)
                }
            };

            match slot {
                Slot::Waiter(mut rx) => loop {
                    if let Some(outcome) = *rx.borrow() {
                        return outcome;
                    }
                    if rx.changed().await.is_err() {
                        // Owner dropped without reporting
                        return TaskOutcome::Failed;
                    }
                },
                Slot::Owner(tx) => {
                    let outcome = this.execute(&name, &state, &cancel).await;
                    let _ = tx.send(Some(outcome));
                    outcome
                }
            }
        })
    }

    /// Deps (parallel), body, stages (sequential).
    async fn execute(&self, name: &str, state: &Arc<RunState>, cancel: &CancelToken) -> TaskOutcome {
        if cancel.is_cancelled() {
            debug!(task = %name, "Superseded before start");
            return TaskOutcome::Cancelled;
        }

        let Some(task) = self.registry.get(name) else {
            // validate() runs first, so this only fires on an internal bug.
            error!(task = %name, "Task vanished from registry mid-run");
            return TaskOutcome::Failed;
        };

        let deps = task.deps();
        if !deps.is_empty() {
            let mut set = JoinSet::new();
            for dep in deps {
                set.spawn(self.run_task(dep.to_string(), Arc::clone(state), cancel.clone()));
            }

            // Let every dep finish and report; only then decide.
            let mut failed = false;
            let mut cancelled = false;
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(TaskOutcome::Succeeded) => {}
                    Ok(TaskOutcome::Cancelled) => cancelled = true,
                    Ok(TaskOutcome::Failed) | Ok(TaskOutcome::Skipped) => failed = true,
                    Err(e) => {
                        error!(task = %name, error = %e, "Dependency task panicked");
                        failed = true;
                    }
                }
            }
            if cancelled {
                return TaskOutcome::Cancelled;
            }
            if failed {
                warn!(task = %name, "Skipped: dependency failed");
                return TaskOutcome::Skipped;
            }
        }

        if cancel.is_cancelled() {
            debug!(task = %name, "Superseded before body");
            return TaskOutcome::Cancelled;
        }

        let start = std::time::Instant::now();
        debug!(task = %name, "Starting");
        if let Err(e) = task.run(&self.ctx).await {
            error!(task = %name, error = %e, "Task failed");
            return TaskOutcome::Failed;
        }
        info!(
            task = %name,
            duration_ms = start.elapsed().as_millis() as u64,
            "Task finished"
        );

        for stage in task.stages() {
            if cancel.is_cancelled() {
                debug!(task = %name, stage = %stage, "Superseded between stages");
                return TaskOutcome::Cancelled;
            }
            match self
                .run_task(stage.to_string(), Arc::clone(state), cancel.clone())
                .await
            {
                TaskOutcome::Succeeded => {}
                TaskOutcome::Cancelled => return TaskOutcome::Cancelled,
                TaskOutcome::Failed | TaskOutcome::Skipped => return TaskOutcome::Failed,
            }
        }

        TaskOutcome::Succeeded
    }
}
