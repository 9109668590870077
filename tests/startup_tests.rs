//! Integration tests for startup: environment resolution precedence,
//! configuration loading, and banner rendering, end to end through
//! `BuildContext::initialize`.

use std::path::PathBuf;
use tempfile::TempDir;
use webforge::context::BuildContext;
use webforge::error::StartupError;

/// Scaffold a minimal project: package.json plus a config directory with
/// the given per-environment settings files.
fn scaffold(configs: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        temp.path().join("package.json"),
        r#"{
            "name": "x",
            "version": "1.0.0",
            "description": "integration fixture",
            "license": "MIT"
        }"#,
    )
    .unwrap();
    for (env, content) in configs {
        std::fs::write(config_dir.join(format!("{env}.json")), content).unwrap();
    }
    (temp, config_dir)
}

#[test]
fn flag_overrides_root_marker() {
    let (temp, config_dir) = scaffold(&[("production", "{}"), ("dev", "{}")]);
    std::fs::write(temp.path().join("NODE_ENV"), "dev\n").unwrap();

    let ctx =
        BuildContext::initialize(temp.path(), &config_dir, Some("production")).unwrap();
    assert_eq!(ctx.env.name, "production");
}

#[test]
fn default_env_loads_matching_config() {
    let (temp, config_dir) = scaffold(&[("test", r#"{"a": 1}"#)]);

    let ctx = BuildContext::initialize(temp.path(), &config_dir, None).unwrap();
    assert_eq!(ctx.env.name, "test");
    assert_eq!(ctx.settings.get("a"), Some(&serde_json::json!(1)));
}

#[test]
fn missing_config_for_resolved_env_aborts() {
    let (temp, config_dir) = scaffold(&[("test", "{}")]);
    std::fs::write(temp.path().join("NODE_ENV"), "staging").unwrap();

    let err = BuildContext::initialize(temp.path(), &config_dir, None).unwrap_err();
    match err {
        StartupError::ConfigNotFound { env, .. } => assert_eq!(env, "staging"),
        other => panic!("expected ConfigNotFound, got {other:?}"),
    }
}

#[test]
fn malformed_config_aborts() {
    let (temp, config_dir) = scaffold(&[]);
    std::fs::write(config_dir.join("test.json"), "{oops").unwrap();

    let err = BuildContext::initialize(temp.path(), &config_dir, None).unwrap_err();
    assert!(matches!(err, StartupError::ConfigParse { .. }));
}

#[test]
fn banner_substitutes_identifiers() {
    let (temp, config_dir) = scaffold(&[("test", "{}")]);
    std::fs::write(temp.path().join("VERSION"), "2.0.1\n").unwrap();
    std::fs::write(temp.path().join("COMMIT"), "abc123\n").unwrap();

    let ctx = BuildContext::initialize(temp.path(), &config_dir, None).unwrap();
    assert!(ctx.banner.header.contains("x@1.0.0"));
    assert!(ctx.banner.header.contains("2.0.1"));
    assert!(ctx.banner.footer.contains("abc123"));
    assert!(!ctx.banner.header.contains("<%="));
    assert!(!ctx.banner.footer.contains("<%="));
}

#[test]
fn resolution_is_byte_identical_across_runs() {
    let (temp, config_dir) = scaffold(&[("test", r#"{"a": 1}"#)]);
    // Timestamp-free templates make the banner fully deterministic.
    std::fs::write(config_dir.join("header.tpl"), "/* <%= pkg.name %> <%= env %> */").unwrap();
    std::fs::write(config_dir.join("footer.tpl"), "/* <%= version %> <%= commit %> */").unwrap();

    let a = BuildContext::initialize(temp.path(), &config_dir, None).unwrap();
    let b = BuildContext::initialize(temp.path(), &config_dir, None).unwrap();

    assert_eq!(a.env, b.env);
    assert_eq!(a.banner, b.banner);
    assert_eq!(a.settings.to_pretty_json(), b.settings.to_pretty_json());
}

#[test]
fn exported_env_var_matches_resolution() {
    let (temp, config_dir) = scaffold(&[("dev", "{}")]);
    std::fs::write(temp.path().join("NODE_ENV"), "dev").unwrap();

    let ctx = BuildContext::initialize(temp.path(), &config_dir, None).unwrap();
    ctx.export_env();
    assert_eq!(std::env::var("NODE_ENV").unwrap(), ctx.env.name);
}
