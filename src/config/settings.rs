//! Environment settings object.
//!
//! `config/<env>.json` is an arbitrary JSON object keyed by option names
//! and consumed verbatim by downstream tasks. Exactly one settings object
//! is active per process lifetime, chosen once at startup.

use crate::error::{StartupError, StartupResult};
use serde_json::{Map, Value};
use std::path::Path;

/// The loaded configuration mapping for the active environment.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: Map<String, Value>,
}

impl Settings {
    /// Load `<config_dir>/<env>.json`.
    ///
    /// A missing file is `ConfigNotFound`, malformed JSON is `ConfigParse`;
    /// both are fatal since no task can run meaningfully without
    /// configuration.
    pub fn load(config_dir: &Path, env: &str) -> StartupResult<Self> {
        let path = config_dir.join(format!("{}.json", env));
        let content = std::fs::read_to_string(&path).map_err(|_| StartupError::ConfigNotFound {
            env: env.to_string(),
            path: path.clone(),
        })?;
        let value: Value =
            serde_json::from_str(&content).map_err(|e| StartupError::ConfigParse {
                path: path.clone(),
                source: e,
            })?;
        let values = match value {
            Value::Object(map) => map,
            other => {
                // A top-level non-object is as unusable as malformed JSON.
                return Err(StartupError::ConfigParse {
                    path,
                    source: serde::de::Error::custom(format!(
                        "expected a JSON object at top level, got {}",
                        json_type_name(&other)
                    )),
                });
            }
        };
        Ok(Self { values })
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Look up a value by dotted path, e.g. `lint.jshint.command`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// String-valued lookup with a default.
    pub fn get_str<'a>(&'a self, path: &str, default: &'a str) -> &'a str {
        self.get(path).and_then(Value::as_str).unwrap_or(default)
    }

    /// Bool-valued lookup with a default.
    pub fn get_bool(&self, path: &str, default: bool) -> bool {
        self.get(path).and_then(Value::as_bool).unwrap_or(default)
    }

    /// The raw underlying mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Pretty JSON rendering for the `show:config` task.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&Value::Object(self.values.clone()))
            .unwrap_or_else(|_| "{}".to_string())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_settings_for_env() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("test.json"), r#"{"a": 1}"#).unwrap();

        let settings = Settings::load(temp.path(), "test").unwrap();
        assert_eq!(settings.get("a"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn test_missing_config_is_config_not_found() {
        let temp = TempDir::new().unwrap();
        let err = Settings::load(temp.path(), "production").unwrap_err();
        assert!(matches!(err, StartupError::ConfigNotFound { ref env, .. } if env == "production"));
    }

    #[test]
    fn test_malformed_config_is_parse_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("dev.json"), "{broken").unwrap();
        let err = Settings::load(temp.path(), "dev").unwrap_err();
        assert!(matches!(err, StartupError::ConfigParse { .. }));
    }

    #[test]
    fn test_top_level_array_rejected() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("dev.json"), "[1, 2]").unwrap();
        let err = Settings::load(temp.path(), "dev").unwrap_err();
        assert!(matches!(err, StartupError::ConfigParse { .. }));
    }

    #[test]
    fn test_dotted_path_lookup() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("test.json"),
            r#"{"lint": {"jshint": {"command": "npx jshint", "enabled": false}}}"#,
        )
        .unwrap();

        let settings = Settings::load(temp.path(), "test").unwrap();
        assert_eq!(
            settings.get_str("lint.jshint.command", "jshint"),
            "npx jshint"
        );
        assert!(!settings.get_bool("lint.jshint.enabled", true));
        // Missing paths fall back to defaults
        assert_eq!(settings.get_str("lint.jscs.command", "jscs"), "jscs");
        assert!(settings.get("lint.nope.deep").is_none());
    }
}
