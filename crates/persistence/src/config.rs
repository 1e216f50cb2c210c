//! Storage configuration.
//!
//! [`StorageConfig`] is a set of `clap` arguments with environment fallbacks,
//! so a binary can flatten it into its own command line and a library user
//! can build it from the environment alone.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DB_TYPE` | document | Active backend (`document` or `relational`) |
//! | `DATABASE_URL` | larder.db | SQLite path, `sqlite://path` or `:memory:` |
//! | `MONGO_URI` | mongodb://localhost:27017/larder | Document store URI |
//! | `MONGO_DATABASE` | from URI, else `larder` | Document database name |
//! | `CACHE_URL` | memory:// | Cache backend (`memory://` or `redis://...`) |
//! | `CACHE_DEFAULT_TIMEOUT` | 300 | Cache TTL (seconds) |
//! | `LARDER_OPEN_ALL_BACKENDS` | false | Open both backends, not just the selected one |
//!
//! # Example
//!
//! ```rust
//! use larder_persistence::config::StorageConfig;
//!
//! let config = StorageConfig {
//!     db_type: "relational".to_string(),
//!     database_url: ":memory:".to_string(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use clap::{Args, Parser};

use crate::core::{BackendKind, BackendSelector, DB_TYPE_ENV};

/// Connection settings for the storage layer.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// Active backend when `DB_TYPE` is not set at call time.
    #[arg(long, env = "DB_TYPE", default_value = "document")]
    pub db_type: String,

    /// SQLite database path.
    #[arg(long, env = "DATABASE_URL", default_value = "larder.db")]
    pub database_url: String,

    /// MongoDB connection URI.
    #[arg(long, env = "MONGO_URI", default_value = "mongodb://localhost:27017/larder")]
    pub mongo_uri: String,

    /// MongoDB database name; defaults to the database in the URI.
    #[arg(long, env = "MONGO_DATABASE")]
    pub mongo_database: Option<String>,

    /// Cache backend URI.
    #[arg(long, env = "CACHE_URL", default_value = "memory://")]
    pub cache_url: String,

    /// Cache time-to-live in seconds.
    #[arg(long, env = "CACHE_DEFAULT_TIMEOUT", default_value = "300")]
    pub cache_default_timeout: u64,

    /// Open both backends so the selection can change at runtime.
    #[arg(long, env = "LARDER_OPEN_ALL_BACKENDS", default_value = "false")]
    pub open_all_backends: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_type: "document".to_string(),
            database_url: "larder.db".to_string(),
            mongo_uri: "mongodb://localhost:27017/larder".to_string(),
            mongo_database: None,
            cache_url: "memory://".to_string(),
            cache_default_timeout: 300,
            open_all_backends: false,
        }
    }
}

#[derive(Parser)]
struct EnvOnly {
    #[command(flatten)]
    config: StorageConfig,
}

impl StorageConfig {
    /// Reads the configuration from environment variables alone.
    pub fn from_env() -> Self {
        EnvOnly::try_parse_from(["larder"])
            .map(|parsed| parsed.config)
            .unwrap_or_default()
    }

    /// Returns a selector that reads `DB_TYPE` on every call and falls back
    /// to the configured value.
    pub fn selector(&self) -> BackendSelector {
        let configured = self.db_type.clone();
        BackendSelector::from_fn(move || {
            std::env::var(DB_TYPE_ENV)
                .ok()
                .or_else(|| Some(configured.clone()))
        })
    }

    /// The backend selected by the configured value.
    pub fn initial_backend(&self) -> BackendKind {
        self.db_type.parse().unwrap_or(BackendKind::DEFAULT)
    }

    /// Returns the backends to open at startup.
    pub fn backends_to_open(&self) -> Vec<BackendKind> {
        if self.open_all_backends {
            BackendKind::all().to_vec()
        } else {
            vec![self.initial_backend()]
        }
    }

    /// SQLite path with any `sqlite://` scheme removed.
    pub fn sqlite_path(&self) -> &str {
        let url = self.database_url.as_str();
        url.strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url)
    }

    /// Document database name.
    pub fn mongo_database_name(&self) -> String {
        if let Some(name) = self.mongo_database.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        let after_scheme = self
            .mongo_uri
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.mongo_uri);
        after_scheme
            .split_once('/')
            .map(|(_, path)| path.split('?').next().unwrap_or_default())
            .filter(|name| !name.is_empty())
            .unwrap_or("larder")
            .to_string()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_default_timeout)
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.db_type.parse::<BackendKind>().is_err() {
            errors.push(format!("Unknown DB_TYPE '{}'", self.db_type));
        }

        if self.sqlite_path().is_empty() {
            errors.push("DATABASE_URL cannot be empty".to_string());
        }

        if !self.mongo_uri.starts_with("mongodb://") && !self.mongo_uri.starts_with("mongodb+srv://")
        {
            errors.push("MONGO_URI must start with mongodb:// or mongodb+srv://".to_string());
        }

        if self.cache_default_timeout == 0 {
            errors.push("Cache timeout cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.database_url, "larder.db");
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.initial_backend(), BackendKind::Document);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_args_parse_from_command_line() {
        let parsed = EnvOnly::try_parse_from([
            "larder",
            "--db-type",
            "sqlite",
            "--database-url",
            "sqlite:///tmp/x.db",
            "--cache-default-timeout",
            "60",
        ])
        .unwrap();
        assert_eq!(parsed.config.initial_backend(), BackendKind::Relational);
        assert_eq!(parsed.config.sqlite_path(), "/tmp/x.db");
        assert_eq!(parsed.config.cache_default_timeout, 60);
    }

    #[test]
    fn test_sqlite_path_variants() {
        let mut config = StorageConfig::default();
        for (url, path) in [
            ("larder.db", "larder.db"),
            ("sqlite://data/larder.db", "data/larder.db"),
            ("sqlite::memory:", ":memory:"),
            (":memory:", ":memory:"),
        ] {
            config.database_url = url.to_string();
            assert_eq!(config.sqlite_path(), path);
        }
    }

    #[test]
    fn test_mongo_database_name() {
        let mut config = StorageConfig::default();
        assert_eq!(config.mongo_database_name(), "larder");

        config.mongo_uri = "mongodb://db:27017/inventory?retryWrites=true".to_string();
        assert_eq!(config.mongo_database_name(), "inventory");

        config.mongo_uri = "mongodb://db:27017".to_string();
        assert_eq!(config.mongo_database_name(), "larder");

        config.mongo_database = Some("override".to_string());
        assert_eq!(config.mongo_database_name(), "override");
    }

    #[test]
    fn test_validate_collects_errors() {
        let config = StorageConfig {
            db_type: "cassandra".to_string(),
            cache_default_timeout: 0,
            mongo_uri: "http://nope".to_string(),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_open_all_backends() {
        let config = StorageConfig {
            open_all_backends: true,
            ..Default::default()
        };
        assert_eq!(config.backends_to_open().len(), 2);
        assert_eq!(
            StorageConfig::default().backends_to_open(),
            vec![BackendKind::Document]
        );
    }
}
