//! Settings loading from configuration files and the environment.
//!
//! A file is deserialized straight into [`Settings`]; every section is
//! `#[serde(default)]`, so keys left out of the file keep their defaults.
//! `ASYNCORM_*` environment variables are applied last and win over the file.
//!
//! | Env Var | Setting |
//! |---|---|
//! | `ASYNCORM_DEBUG` | `debug` |
//! | `ASYNCORM_LOG_LEVEL` | `log_level` |
//! | `ASYNCORM_DB_NAME` | `database.name` |
//! | `ASYNCORM_DB_HOST` | `database.host` |
//! | `ASYNCORM_DB_PORT` | `database.port` |
//! | `ASYNCORM_DB_USER` | `database.user` |
//! | `ASYNCORM_DB_PASSWORD` | `database.password` |
//! | `ASYNCORM_DB_POOL_SIZE` | `database.pool_size` |
//!
//! ```rust,no_run
//! use asyncorm_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("asyncorm.toml").unwrap();
//! ```

use std::path::Path;
use std::str::FromStr;

use crate::error::OrmError;
use crate::settings::Settings;

/// Parses settings from TOML text.
///
/// # Errors
///
/// Returns [`OrmError::ConfigurationError`] if the TOML is malformed or a key
/// has the wrong type.
pub fn from_toml_str(text: &str) -> Result<Settings, OrmError> {
    toml::from_str(text)
        .map_err(|e| OrmError::ConfigurationError(format!("Invalid TOML settings: {e}")))
}

/// Parses settings from JSON text.
///
/// # Errors
///
/// Returns [`OrmError::ConfigurationError`] if the JSON is malformed or a key
/// has the wrong type.
pub fn from_json_str(text: &str) -> Result<Settings, OrmError> {
    serde_json::from_str(text)
        .map_err(|e| OrmError::ConfigurationError(format!("Invalid JSON settings: {e}")))
}

/// Reads a TOML settings file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, OrmError> {
    from_toml_str(&read(path.as_ref())?)
}

/// Reads a JSON settings file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, OrmError> {
    from_json_str(&read(path.as_ref())?)
}

/// Reads a TOML settings file, then applies the environment on top.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, OrmError> {
    from_toml_file(path).map(with_env)
}

/// Reads a JSON settings file, then applies the environment on top.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, OrmError> {
    from_json_file(path).map(with_env)
}

/// Default settings with the environment applied.
pub fn from_env() -> Settings {
    with_env(Settings::default())
}

/// Applies `ASYNCORM_*` environment variable overrides in place.
///
/// Numeric variables that fail to parse leave the current value untouched.
/// `ASYNCORM_DEBUG` accepts "true", "1" or "yes" (case-insensitive) as true.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Some(flag) = env("ASYNCORM_DEBUG") {
        settings.debug = matches!(flag.to_ascii_lowercase().as_str(), "true" | "1" | "yes");
    }
    set_from_env(&mut settings.log_level, "ASYNCORM_LOG_LEVEL");

    let db = &mut settings.database;
    set_from_env(&mut db.name, "ASYNCORM_DB_NAME");
    set_from_env(&mut db.host, "ASYNCORM_DB_HOST");
    set_from_env(&mut db.user, "ASYNCORM_DB_USER");
    set_from_env(&mut db.password, "ASYNCORM_DB_PASSWORD");
    set_from_env(&mut db.port, "ASYNCORM_DB_PORT");
    set_from_env(&mut db.pool_size, "ASYNCORM_DB_POOL_SIZE");
}

fn with_env(mut settings: Settings) -> Settings {
    apply_env_overrides(&mut settings);
    settings
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn set_from_env<T: FromStr>(slot: &mut T, key: &str) {
    if let Some(parsed) = env(key).and_then(|raw| raw.parse().ok()) {
        *slot = parsed;
    }
}

fn read(path: &Path) -> Result<String, OrmError> {
    std::fs::read_to_string(path).map_err(|e| {
        OrmError::ConfigurationError(format!(
            "Cannot read settings file '{}': {e}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests share the process environment: each variable belongs to one test.

    fn scratch_file(name: &str, body: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("asyncorm_settings_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn toml_overrides_only_given_keys() {
        let settings = from_toml_str(
            r#"
            debug = false
            log_level = "asyncorm_db=debug"

            [database]
            name = "library"
            port = 5433
            "#,
        )
        .unwrap();

        assert!(!settings.debug);
        assert_eq!(settings.log_level, "asyncorm_db=debug");
        assert_eq!(settings.database.name, "library");
        assert_eq!(settings.database.port, 5433);
        assert_eq!(settings.database.host, "localhost");
        assert_eq!(settings.database.user, "sanicdbuser");
    }

    #[test]
    fn empty_sources_give_defaults() {
        assert_eq!(from_toml_str("").unwrap(), Settings::default());
        assert_eq!(from_json_str("{}").unwrap(), Settings::default());
    }

    #[test]
    fn malformed_sources_are_configuration_errors() {
        for result in [
            from_toml_str("[[database"),
            from_toml_str("[database]\nport = \"five\""),
            from_json_str("{\"database\":"),
            from_toml_file("/nonexistent/asyncorm.toml"),
        ] {
            assert!(matches!(result, Err(OrmError::ConfigurationError(_))));
        }
    }

    #[test]
    fn json_nested_database_section() {
        let settings =
            from_json_str(r#"{"database": {"host": "db.internal", "pool_size": 16}}"#).unwrap();
        assert_eq!(settings.database.host, "db.internal");
        assert_eq!(settings.database.pool_size, 16);
        assert!(settings.debug);
    }

    #[test]
    fn json_file_is_read() {
        let path = scratch_file("settings.json", r#"{"database": {"name": "json_file"}}"#);
        assert_eq!(from_json_file(&path).unwrap().database.name, "json_file");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn debug_flag_from_env() {
        let mut settings = Settings::default();
        std::env::set_var("ASYNCORM_DEBUG", "0");
        apply_env_overrides(&mut settings);
        assert!(!settings.debug);

        std::env::set_var("ASYNCORM_DEBUG", "YES");
        apply_env_overrides(&mut settings);
        assert!(settings.debug);
        std::env::remove_var("ASYNCORM_DEBUG");
    }

    #[test]
    fn unparsable_port_keeps_previous_value() {
        let mut settings = Settings::default();
        std::env::set_var("ASYNCORM_DB_PORT", "6543");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.database.port, 6543);

        std::env::set_var("ASYNCORM_DB_PORT", "not-a-number");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.database.port, 6543);
        std::env::remove_var("ASYNCORM_DB_PORT");
    }

    #[test]
    fn env_only_settings() {
        std::env::set_var("ASYNCORM_DB_NAME", "env_db");
        std::env::set_var("ASYNCORM_DB_POOL_SIZE", "12");
        std::env::set_var("ASYNCORM_LOG_LEVEL", "trace");
        let settings = from_env();
        assert_eq!(settings.database.name, "env_db");
        assert_eq!(settings.database.pool_size, 12);
        assert_eq!(settings.log_level, "trace");
        for key in ["ASYNCORM_DB_NAME", "ASYNCORM_DB_POOL_SIZE", "ASYNCORM_LOG_LEVEL"] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn env_wins_over_toml_file() {
        let path = scratch_file(
            "settings.toml",
            "[database]\nhost = \"toml-host\"\nuser = \"toml-user\"\npassword = \"toml\"\n",
        );
        std::env::set_var("ASYNCORM_DB_HOST", "env-host");
        std::env::set_var("ASYNCORM_DB_PASSWORD", "env-password");

        let settings = from_toml_file_with_env(&path).unwrap();
        assert_eq!(settings.database.host, "env-host");
        assert_eq!(settings.database.password, "env-password");
        assert_eq!(settings.database.user, "toml-user");

        std::env::remove_var("ASYNCORM_DB_HOST");
        std::env::remove_var("ASYNCORM_DB_PASSWORD");
        std::fs::remove_file(&path).ok();
    }
}
