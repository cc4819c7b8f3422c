//! Database access: connection, migrations, song store

pub mod init;
pub mod migrations;
pub mod models;
pub mod songs;

pub use init::connect;
pub use migrations::run_migrations;
pub use songs::SongStore;

use crate::{Error, Result};

/// SQL dialect behind the connection URL
///
/// Only DDL differs between dialects; every runtime statement is written to
/// run unchanged on both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn from_url(url: &str) -> Result<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Dialect::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Dialect::Sqlite)
        } else {
            let scheme = url.split(':').next().unwrap_or_default();
            Err(Error::Config(format!("unsupported database scheme: {}", scheme)))
        }
    }
}
