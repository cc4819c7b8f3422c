//! Configuration loading and resolution
//!
//! Every setting is resolved in priority order:
//! 1. Command-line argument or environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)
//!
//! Each source is read into a [`ConfigLayer`]; layers are stacked with
//! [`ConfigLayer::or`] and turned into a validated [`ServiceConfig`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use sqlx::ConnectOptions;

use crate::db::Dialect;
use crate::{Error, Result};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_USER: &str = "postgres";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_DB_STATEMENT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ENRICHMENT_TIMEOUT_SECS: u64 = 10;

/// One partially-filled source of configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub listen: Option<String>,
    pub database: DatabaseLayer,
    pub enrichment: EnrichmentLayer,
}

/// `[database]` table
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseLayer {
    /// Full connection URL; takes precedence over the individual fields
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub max_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub statement_timeout_secs: Option<u64>,
}

/// `[enrichment]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichmentLayer {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ConfigLayer {
    /// Read a layer from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Stack `self` on top of `lower`: values set in `self` win
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            listen: self.listen.or(lower.listen),
            database: DatabaseLayer {
                url: self.database.url.or(lower.database.url),
                host: self.database.host.or(lower.database.host),
                port: self.database.port.or(lower.database.port),
                user: self.database.user.or(lower.database.user),
                password: self.database.password.or(lower.database.password),
                name: self.database.name.or(lower.database.name),
                max_connections: self.database.max_connections.or(lower.database.max_connections),
                acquire_timeout_secs: self
                    .database
                    .acquire_timeout_secs
                    .or(lower.database.acquire_timeout_secs),
                statement_timeout_secs: self
                    .database
                    .statement_timeout_secs
                    .or(lower.database.statement_timeout_secs),
            },
            enrichment: EnrichmentLayer {
                base_url: self.enrichment.base_url.or(lower.enrichment.base_url),
                timeout_secs: self.enrichment.timeout_secs.or(lower.enrichment.timeout_secs),
            },
        }
    }
}

impl fmt::Debug for DatabaseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseLayer")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("statement_timeout_secs", &self.statement_timeout_secs)
            .finish()
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Socket address the HTTP listener binds to
    pub listen: String,
    pub database: DatabaseConfig,
    pub enrichment: EnrichmentConfig,
}

/// Relational store connection settings
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Server-side limit for one statement (PostgreSQL only)
    pub statement_timeout: Duration,
}

/// External enrichment service settings
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub base_url: String,
    /// Upper bound for one lookup, connect through body
    pub timeout: Duration,
}

impl ServiceConfig {
    /// Apply compiled defaults to `layer` and validate the result
    pub fn resolve(layer: ConfigLayer) -> Result<Self> {
        let db = layer.database;
        let config = ServiceConfig {
            listen: layer.listen.unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            database: DatabaseConfig {
                url: db.url.filter(|u| !u.trim().is_empty()),
                host: db.host.unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
                port: db.port.unwrap_or(DEFAULT_DB_PORT),
                user: db.user.unwrap_or_else(|| DEFAULT_DB_USER.to_string()),
                password: db.password.unwrap_or_default(),
                name: db.name.unwrap_or_default(),
                max_connections: db.max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
                acquire_timeout: Duration::from_secs(
                    db.acquire_timeout_secs.unwrap_or(DEFAULT_DB_ACQUIRE_TIMEOUT_SECS),
                ),
                statement_timeout: Duration::from_secs(
                    db.statement_timeout_secs.unwrap_or(DEFAULT_DB_STATEMENT_TIMEOUT_SECS),
                ),
            },
            enrichment: EnrichmentConfig {
                base_url: layer.enrichment.base_url.unwrap_or_default(),
                timeout: Duration::from_secs(
                    layer
                        .enrichment
                        .timeout_secs
                        .unwrap_or(DEFAULT_ENRICHMENT_TIMEOUT_SECS),
                ),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen.trim().is_empty() {
            return Err(Error::Config("listen address must not be empty".to_string()));
        }
        self.database.validate()?;
        self.enrichment.validate()
    }
}

impl DatabaseConfig {
    /// Settings for a full connection URL, pool settings left at their defaults
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            user: DEFAULT_DB_USER.to_string(),
            password: String::new(),
            name: String::new(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_DB_ACQUIRE_TIMEOUT_SECS),
            statement_timeout: Duration::from_secs(DEFAULT_DB_STATEMENT_TIMEOUT_SECS),
        }
    }

    /// Connection URL, built from the individual PostgreSQL fields unless a
    /// full URL was configured
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .to_url_lossy()
            .to_string()
    }

    pub fn dialect(&self) -> Result<Dialect> {
        match &self.url {
            Some(url) => Dialect::from_url(url),
            None => Ok(Dialect::Postgres),
        }
    }

    /// Human-readable target for logs; never includes credentials
    ///
    /// PostgreSQL URLs are parsed and reduced to user, host, port and
    /// database. SQLite URLs lose their query string.
    pub fn describe(&self) -> String {
        let Some(url) = &self.url else {
            return format!("{}:{}/{}", self.host, self.port, self.name);
        };

        match Dialect::from_url(url) {
            Ok(Dialect::Postgres) => match PgConnectOptions::from_str(url) {
                Ok(options) => format!(
                    "{}@{}:{}/{}",
                    options.get_username(),
                    options.get_host(),
                    options.get_port(),
                    options.get_database().unwrap_or_default()
                ),
                Err(_) => "<unparseable postgres url>".to_string(),
            },
            Ok(Dialect::Sqlite) => url.split('?').next().unwrap_or_default().to_string(),
            Err(_) => "<unsupported database url>".to_string(),
        }
    }

    fn validate(&self) -> Result<()> {
        self.dialect()?;
        if self.url.is_none() && self.name.trim().is_empty() {
            return Err(Error::Config(
                "database name is required when no database URL is given".to_string(),
            ));
        }
        if self.statement_timeout.is_zero() {
            return Err(Error::Config("database statement timeout must be positive".to_string()));
        }
        if self.max_connections == 0 {
            return Err(Error::Config("database max_connections must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("target", &self.describe())
            .field("user", &self.user)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("statement_timeout", &self.statement_timeout)
            .finish_non_exhaustive()
    }
}

impl EnrichmentConfig {
    fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(Error::Config("enrichment base URL is required".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "enrichment base URL must be http(s): {}",
                url
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("enrichment timeout must be positive".to_string()));
        }
        Ok(())
    }
}
