//! Settings loading from configuration files.
//!
//! This module provides functions to load [`Settings`] from TOML files, JSON
//! files, and to apply environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `DBAL_DEBUG` | `debug` |
//! | `DBAL_LOG_LEVEL` | `log_level` |
//! | `DBAL_TIME_ZONE` | `time_zone` |
//! | `DBAL_CACHE_VERSION` | `cache.version` |
//! | `DBAL_QUERY_LOG_SIZE` | `query_log_size` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use dbal_rs_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file("config/dbal.toml").unwrap();
//! let settings = settings_loader::from_toml_file_with_env("config/dbal.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::DbalError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, DbalError> {
    // Go through serde_json::Value so that missing keys fall back to the
    // defaults instead of failing deserialization.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| DbalError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_into_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, DbalError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, DbalError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, DbalError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| DbalError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_into_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, DbalError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, DbalError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `DBAL_*` environment variable overrides to a settings struct.
///
/// `DBAL_DEBUG` accepts "true"/"1"/"yes"; anything else means false. An
/// unparseable `DBAL_QUERY_LOG_SIZE` is ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("DBAL_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("DBAL_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("DBAL_TIME_ZONE") {
        settings.time_zone = val;
    }

    if let Ok(val) = std::env::var("DBAL_CACHE_VERSION") {
        settings.cache.version = val;
    }

    if let Ok(val) = std::env::var("DBAL_QUERY_LOG_SIZE") {
        if let Ok(size) = val.parse::<usize>() {
            settings.query_log_size = size;
        }
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_config(path: &Path, format: &str) -> Result<String, DbalError> {
    std::fs::read_to_string(path).map_err(|e| {
        DbalError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_into_defaults(value: serde_json::Value, format: &str) -> Result<Settings, DbalError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        DbalError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        DbalError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            time_zone = "Europe/Prague"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.time_zone, "Europe/Prague");
        // Defaults preserved
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.cache.version, "v2");
    }

    #[test]
    fn test_from_toml_str_databases() {
        let toml = r#"
            [databases.default]
            engine = "pgsql"
            name = "mydb"
            user = "myuser"
            password = "mypass"
            host = "localhost"
            port = 5432
            connection_time_zone = "+00:00"
        "#;

        let settings = from_toml_str(toml).unwrap();
        let db = settings.databases.get("default").unwrap();
        assert_eq!(db.engine, "pgsql");
        assert_eq!(db.name, "mydb");
        assert_eq!(db.port, 5432);
        assert_eq!(db.connection_time_zone.as_deref(), Some("+00:00"));
    }

    #[test]
    fn test_from_toml_str_cache() {
        let toml = r#"
            [cache]
            version = "v3"
            timeout = 600
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.cache.version, "v3");
        assert_eq!(settings.cache.timeout, Some(600));
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.time_zone, "UTC");
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("[[invalid toml content");
        assert!(matches!(result, Err(DbalError::ConfigurationError(_))));
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{
            "debug": false,
            "log_level": "debug",
            "query_log_size": 5
        }"#;

        let settings = from_json_str(json).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.query_log_size, 5);
        assert_eq!(settings.time_zone, "UTC");
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{invalid json").is_err());
    }

    // ── File loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbal.toml");
        std::fs::write(&path, "time_zone = \"America/New_York\"\n").unwrap();

        let settings = from_toml_file(&path).unwrap();
        assert_eq!(settings.time_zone, "America/New_York");
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbal.json");
        std::fs::write(&path, r#"{"debug": false}"#).unwrap();

        let settings = from_json_file(&path).unwrap();
        assert!(!settings.debug);
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = from_toml_file("/nonexistent/path/dbal.toml");
        assert!(result.is_err());
    }

    // ── Environment variable overrides ──────────────────────────────

    #[test]
    fn test_apply_env_overrides_time_zone() {
        let mut settings = Settings::default();
        std::env::set_var("DBAL_TIME_ZONE", "Asia/Tokyo");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.time_zone, "Asia/Tokyo");
        std::env::remove_var("DBAL_TIME_ZONE");
    }

    #[test]
    fn test_apply_env_overrides_cache_version() {
        let mut settings = Settings::default();
        std::env::set_var("DBAL_CACHE_VERSION", "v9");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.cache.version, "v9");
        std::env::remove_var("DBAL_CACHE_VERSION");
    }

    #[test]
    fn test_apply_env_overrides_invalid_log_size() {
        let mut settings = Settings::default();
        std::env::set_var("DBAL_QUERY_LOG_SIZE", "lots");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.query_log_size, 100);
        std::env::remove_var("DBAL_QUERY_LOG_SIZE");
    }

    #[test]
    fn test_toml_with_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbal_env.toml");
        std::fs::write(&path, "debug = true\nlog_level = \"warn\"\n").unwrap();

        std::env::set_var("DBAL_DEBUG", "false");
        let settings = from_toml_file_with_env(&path).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "warn");
        std::env::remove_var("DBAL_DEBUG");
    }

    // ── merge_json helper ───────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"outer": {"a": 1, "b": 2}});
        let over = serde_json::json!({"outer": {"b": 3}});
        let merged = merge_json(base, over);
        assert_eq!(merged["outer"]["a"], 1);
        assert_eq!(merged["outer"]["b"], 3);
    }

    #[test]
    fn test_merge_json_array_override() {
        let base = serde_json::json!({"list": [1, 2, 3]});
        let over = serde_json::json!({"list": [4, 5]});
        let merged = merge_json(base, over);
        assert_eq!(merged["list"], serde_json::json!([4, 5]));
    }
}
