//! Integration tests for the task graph over a scaffolded project:
//! build, dist, deploy, clean, and the prod sequence.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use webforge::context::BuildContext;
use webforge::graph::{CancelToken, Scheduler};
use webforge::tasks;

/// Scaffold a project with CSS/JS/image sources and build a scheduler
/// over it. VERSION is pinned so the build/dist directories are stable.
fn scaffold() -> (TempDir, Scheduler) {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let config_dir = root.join("config");
    std::fs::create_dir_all(&config_dir).unwrap();

    std::fs::write(
        root.join("package.json"),
        r#"{"name": "site", "version": "1.0.0", "title": "Fixture Site"}"#,
    )
    .unwrap();
    std::fs::write(root.join("VERSION"), "9.9.9\n").unwrap();
    std::fs::write(config_dir.join("test.json"), "{}").unwrap();

    std::fs::create_dir_all(root.join("src/assets/css")).unwrap();
    std::fs::create_dir_all(root.join("src/assets/js/app")).unwrap();
    std::fs::create_dir_all(root.join("src/assets/img")).unwrap();
    std::fs::write(root.join("src/index.html"), "<html></html>").unwrap();
    std::fs::write(root.join("src/assets/css/app.css"), "body { margin: 0; }").unwrap();
    std::fs::write(root.join("src/assets/js/app/main.js"), "var app = {};").unwrap();
    std::fs::write(root.join("src/assets/img/logo.png"), [0x89, 0x50]).unwrap();

    let ctx = BuildContext::initialize(root, &config_dir, None).unwrap();
    let scheduler = Scheduler::new(Arc::new(tasks::registry()), Arc::new(ctx));
    (temp, scheduler)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn build_syncs_and_stamps_assets() {
    let (temp, sched) = scaffold();
    sched.run("build", CancelToken::never()).await.unwrap();

    let build = temp.path().join("build-9.9.9");
    assert!(build.join("index.html").exists());

    // Text assets are banner-stamped; the banner carries the package id.
    let css = read(&build.join("assets/css/app.css"));
    assert!(css.contains("site@1.0.0"));
    assert!(css.contains("body { margin: 0; }"));
    let js = read(&build.join("assets/js/app/main.js"));
    assert!(js.contains("site@1.0.0"));

    // Images are copied verbatim.
    assert_eq!(
        std::fs::read(build.join("assets/img/logo.png")).unwrap(),
        vec![0x89, 0x50]
    );

    // Sources themselves are untouched.
    assert_eq!(
        read(&temp.path().join("src/assets/css/app.css")),
        "body { margin: 0; }"
    );
}

#[tokio::test]
async fn build_twice_does_not_double_stamp() {
    let (temp, sched) = scaffold();
    sched.run("build", CancelToken::never()).await.unwrap();
    let css_path = temp.path().join("build-9.9.9/assets/css/app.css");
    let first = read(&css_path);

    sched.run("build", CancelToken::never()).await.unwrap();
    assert_eq!(read(&css_path), first);
}

#[tokio::test]
async fn dist_stages_the_build_tree() {
    let (temp, sched) = scaffold();
    sched.run("build", CancelToken::never()).await.unwrap();
    sched.run("dist", CancelToken::never()).await.unwrap();

    let dist = temp.path().join("dist-9.9.9");
    assert!(dist.join("index.html").exists());
    assert!(dist.join("assets/css/app.css").exists());
}

#[tokio::test]
async fn prod_builds_then_deploys() {
    let (temp, sched) = scaffold();
    sched.run("prod", CancelToken::never()).await.unwrap();

    let web = temp.path().join("webroot");
    assert!(web.join("index.html").exists());
    assert!(read(&web.join("assets/css/app.css")).contains("site@1.0.0"));
}

#[tokio::test]
async fn clean_removes_versioned_directories() {
    let (temp, sched) = scaffold();
    sched.run("build", CancelToken::never()).await.unwrap();
    sched.run("dist", CancelToken::never()).await.unwrap();
    assert!(temp.path().join("build-9.9.9").exists());

    sched.run("clean", CancelToken::never()).await.unwrap();
    assert!(!temp.path().join("build-9.9.9").exists());
    assert!(!temp.path().join("dist-9.9.9").exists());

    // Clean on an already-clean tree is fine.
    sched.run("clean", CancelToken::never()).await.unwrap();
}

#[tokio::test]
async fn every_registered_task_validates() {
    let (_temp, sched) = scaffold();
    for name in tasks::registry().names() {
        sched
            .validate(name)
            .unwrap_or_else(|e| panic!("task '{name}' failed validation: {e}"));
    }
}

#[tokio::test]
async fn watch_sequences_validate_against_registry() {
    let (_temp, sched) = scaffold();
    for name in webforge::watch::CSS_SEQUENCE
        .iter()
        .chain(webforge::watch::JS_SEQUENCE.iter())
    {
        sched.validate(name).unwrap();
    }
}
