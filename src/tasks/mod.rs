//! The built-in task set.
//!
//! Leaf tasks live in the submodules; this module assembles the full
//! registry, including the pure-composition tasks that only wire other
//! tasks together, and owns the environment dispatch used by the
//! `default` task.

pub mod assets;
pub mod lint;
pub mod show;
pub mod sync;

use crate::graph::{CompositeTask, TaskRegistry};

/// Task the environment dispatch falls back to for unknown environments.
pub const USAGE_TASK: &str = "usage";

/// Build the registry of every named task.
pub fn registry() -> TaskRegistry {
    let mut reg = TaskRegistry::new();

    // Leaf tasks
    reg.register(sync::SyncSrcToBuild);
    reg.register(sync::SyncBuildToDist);
    reg.register(sync::SyncBuildToWeb);
    reg.register(sync::CleanBuild);
    reg.register(sync::CleanDist);
    reg.register(assets::BuildCss);
    reg.register(assets::BuildJs);
    reg.register(assets::BuildImg);
    reg.register(assets::Populate);
    reg.register(lint::Jscs);
    reg.register(lint::Jshint);
    reg.register(lint::Bower);
    reg.register(show::ShowConfig);
    reg.register(show::ShowSrc);
    reg.register(show::Usage);

    // Composition
    reg.register(CompositeTask::new("lint", vec!["jscs", "jshint"]));
    reg.register(CompositeTask::new(
        "test",
        vec!["lint", "usage", "show:config", "show:src"],
    ));
    reg.register(CompositeTask::new("dev", vec!["build:dev"]));
    reg.register(CompositeTask::new(
        "clean",
        vec!["clean:build", "clean:dist"],
    ));
    reg.register(CompositeTask::new(
        "build:assets",
        vec!["build:css", "build:js", "build:img"],
    ));
    reg.register(
        CompositeTask::new("build", vec!["bower", "sync:src2build"])
            .with_stages(vec!["build:assets"]),
    );
    reg.register(
        CompositeTask::new("build:dev", vec!["bower", "sync:src2build"])
            .with_stages(vec!["build:assets"]),
    );
    reg.register(CompositeTask::new("prod", vec!["build"]).with_stages(vec!["deploy"]));
    reg.register(
        CompositeTask::new("dist", vec!["clean:dist"]).with_stages(vec!["sync:build2dist"]),
    );
    reg.register(CompositeTask::new("deploy", vec!["sync:build2web"]));

    reg
}

/// Map the resolved environment name to the task the `default` task
/// dispatches to. Unknown environments fall back to `usage`.
pub fn dispatch_for_env(env: &str) -> &'static str {
    match env {
        "test" => "test",
        "dev" | "development" => "dev",
        "production" => "prod",
        _ => USAGE_TASK,
    }
}
