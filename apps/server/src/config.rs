//! # Server Configuration
//!
//! Layered configuration loaded with the `config` crate.
//!
//! ```text
//! defaults  ──►  tavolo.toml (optional)  ──►  TAVOLO_* environment
//!   lowest                                        highest
//! ```
//!
//! | Key               | Env                      | Default        |
//! |-------------------|--------------------------|----------------|
//! | `http_host`       | `TAVOLO_HTTP_HOST`       | `0.0.0.0`      |
//! | `http_port`       | `TAVOLO_HTTP_PORT`       | `8080`         |
//! | `database_path`   | `TAVOLO_DATABASE_PATH`   | `./tavolo.db`  |
//! | `max_connections` | `TAVOLO_MAX_CONNECTIONS` | `5`            |
//! | `busy_timeout_ms` | `TAVOLO_BUSY_TIMEOUT_MS` | `5000`         |
//! | `cors_permissive` | `TAVOLO_CORS_PERMISSIVE` | `true`         |

use serde::Deserialize;
use std::time::Duration;
use tavolo_db::DbConfig;

/// Default configuration file, looked up relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tavolo";

/// Server configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub http_host: String,

    /// HTTP port.
    pub http_port: u16,

    /// SQLite database file.
    pub database_path: String,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// How long a writer waits for SQLite's write lock, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Allow any origin (web and mobile frontends on other ports).
    pub cors_permissive: bool,
}

impl ServerConfig {
    /// Loads configuration from `tavolo.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads configuration using `file` (extension optional) as the file layer.
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("http_host", "0.0.0.0")?
            .set_default("http_port", 8080)?
            .set_default("database_path", "./tavolo.db")?
            .set_default("max_connections", 5)?
            .set_default("busy_timeout_ms", 5000)?
            .set_default("cors_permissive", true)?
            .add_source(config::File::with_name(file).required(false))
            .add_source(config::Environment::with_prefix("TAVOLO").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue("database_path".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        Ok(())
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Pool settings for [`tavolo_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "http_port = 9191").unwrap();
        writeln!(file, "database_path = \"/var/lib/tavolo/orders.db\"").unwrap();
        writeln!(file, "cors_permissive = false").unwrap();

        let path = file.path().to_str().unwrap();
        let config = ServerConfig::load_from(path).unwrap();

        assert_eq!(config.http_port, 9191);
        assert_eq!(config.database_path, "/var/lib/tavolo/orders.db");
        assert!(!config.cors_permissive);
        assert_eq!(config.http_host, "0.0.0.0");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.bind_address(), "0.0.0.0:9191");
    }

    #[test]
    fn test_rejects_zero_connections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_connections = 0").unwrap();

        let path = file.path().to_str().unwrap();
        assert!(matches!(
            ServerConfig::load_from(path),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_db_config() {
        let config = ServerConfig {
            http_host: "127.0.0.1".to_string(),
            http_port: 8080,
            database_path: "tavolo.db".to_string(),
            max_connections: 3,
            busy_timeout_ms: 250,
            cors_permissive: true,
        };

        let db = config.db_config();
        assert_eq!(db.max_connections, 3);
        assert_eq!(db.busy_timeout, Duration::from_millis(250));
        assert!(db.run_migrations);
    }
}
