//! Connection parameters shared by every backend.

use std::fmt;

use asyncorm_core::DatabaseSettings;

/// Where to connect and how many pooled connections to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Database name.
    pub name: String,
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login role.
    pub user: String,
    /// Empty means no password is sent.
    pub password: String,
    /// Maximum number of pooled connections.
    pub pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::from_settings(&DatabaseSettings::default())
    }
}

impl From<&DatabaseSettings> for DatabaseConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        Self::from_settings(settings)
    }
}

impl DatabaseConfig {
    /// PostgreSQL parameters with the default pool size.
    pub fn postgres(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let settings = DatabaseSettings {
            name: name.into(),
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            ..DatabaseSettings::default()
        };
        Self::from_settings(&settings)
    }

    /// Takes the `[database]` section of the settings as is.
    pub fn from_settings(settings: &DatabaseSettings) -> Self {
        let DatabaseSettings {
            name,
            host,
            port,
            user,
            password,
            pool_size,
        } = settings.clone();
        Self {
            name,
            host,
            port,
            user,
            password,
            pool_size,
        }
    }

    /// Overrides the maximum number of pooled connections.
    #[must_use]
    pub const fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }
}

/// Renders `user@host:port/name`, never the password.
impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.name)
    }
}
