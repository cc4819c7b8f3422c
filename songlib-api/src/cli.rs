//! Command-line and environment configuration
//!
//! Every flag can also be given as an environment variable (or in `.env`).
//! Values found here override the optional TOML config file.

use std::path::PathBuf;

use clap::Parser;
use songlib_common::config::{ConfigLayer, DatabaseLayer, EnrichmentLayer, ServiceConfig};

/// Song catalog HTTP service
#[derive(Debug, Parser)]
#[command(name = "songlib-api", version, about)]
pub struct Cli {
    /// TOML config file
    #[arg(long, short = 'c', env = "SONGLIB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080
    #[arg(long, env = "SONGLIB_LISTEN")]
    pub listen: Option<String>,

    /// Full database URL (postgres://... or sqlite:...); overrides the DB_* fields
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "DB_HOST")]
    pub db_host: Option<String>,

    #[arg(long, env = "DB_PORT")]
    pub db_port: Option<u16>,

    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,

    #[arg(long, env = "DB_MAX_CONNECTIONS")]
    pub db_max_connections: Option<u32>,

    /// Seconds to wait for a free pooled connection
    #[arg(long, env = "DB_ACQUIRE_TIMEOUT_SECS")]
    pub db_acquire_timeout_secs: Option<u64>,

    /// Seconds before PostgreSQL cancels a running statement
    #[arg(long, env = "DB_STATEMENT_TIMEOUT_SECS")]
    pub db_statement_timeout_secs: Option<u64>,

    /// Base URL of the enrichment service
    #[arg(long, env = "EXTERNAL_API_URL")]
    pub external_api_url: Option<String>,

    /// Seconds before an enrichment lookup is abandoned
    #[arg(long, env = "EXTERNAL_API_TIMEOUT_SECS")]
    pub external_api_timeout_secs: Option<u64>,
}

impl Cli {
    /// Flags/env as the highest-priority config layer
    pub fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            listen: self.listen.clone(),
            database: DatabaseLayer {
                url: self.database_url.clone(),
                host: self.db_host.clone(),
                port: self.db_port,
                user: self.db_user.clone(),
                password: self.db_password.clone(),
                name: self.db_name.clone(),
                max_connections: self.db_max_connections,
                acquire_timeout_secs: self.db_acquire_timeout_secs,
                statement_timeout_secs: self.db_statement_timeout_secs,
            },
            enrichment: EnrichmentLayer {
                base_url: self.external_api_url.clone(),
                timeout_secs: self.external_api_timeout_secs,
            },
        }
    }

    /// Resolve flags/env over the config file over compiled defaults
    pub fn resolve(&self) -> songlib_common::Result<ServiceConfig> {
        let file_layer = match &self.config {
            Some(path) => ConfigLayer::from_toml_file(path)?,
            None => ConfigLayer::default(),
        };
        ServiceConfig::resolve(self.layer().or(file_layer))
    }
}
