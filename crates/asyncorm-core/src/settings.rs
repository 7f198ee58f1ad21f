//! Runtime configuration.
//!
//! [`Settings`] holds the debug flag, the log filter and the database
//! connection parameters. Defaults match a local development database, so an
//! empty configuration file is valid.

use serde::{Deserialize, Serialize};

/// Database connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// The database name.
    pub name: String,
    /// The server host.
    pub host: String,
    /// The server port.
    pub port: u16,
    /// The database user.
    pub user: String,
    /// The database password.
    pub password: String,
    /// Maximum number of pooled connections.
    pub pool_size: usize,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            name: "asyncorm".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            user: "sanicdbuser".to_string(),
            password: "sanicDbPass".to_string(),
            pool_size: 4,
        }
    }
}

/// The complete set of ORM settings.
///
/// # Examples
///
/// ```
/// use asyncorm_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.database.port, 5432);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether debug mode is enabled. Selects pretty log output.
    pub debug: bool,
    /// The `EnvFilter` directive used by [`setup_logging`](crate::logging::setup_logging).
    pub log_level: String,
    /// Connection parameters for the database.
    pub database: DatabaseSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            database: DatabaseSettings::default(),
        }
    }
}
