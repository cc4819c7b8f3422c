//! Database connection
//!
//! The pool is opened once at startup and shared by every request handler.
//! A failed connect or liveness check is returned to the caller, which is
//! expected to abort startup.
//!
//! The acquire timeout bounds the wait for a pooled connection. On PostgreSQL
//! every new connection also gets a server-side `statement_timeout`, so a
//! statement that hangs after acquiring a connection is cancelled too.
//! SQLite runs in-process and only blocks on locks, which sqlx bounds with
//! its busy timeout.

use std::time::Duration;

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::db::Dialect;
use crate::Result;

/// Open the connection pool and verify the database answers
pub async fn connect(config: &DatabaseConfig) -> Result<AnyPool> {
    sqlx::any::install_default_drivers();

    let url = config.connection_url();
    let dialect = config.dialect()?;
    let mut options = AnyPoolOptions::new().acquire_timeout(config.acquire_timeout);

    if let Some(statement) = session_setup_sql(dialect, config.statement_timeout) {
        options = options.after_connect(move |conn, _meta| {
            let statement = statement.clone();
            Box::pin(async move {
                sqlx::query(&statement).execute(&mut *conn).await?;
                Ok(())
            })
        });
    }

    // Every connection to an in-memory SQLite database sees its own empty
    // database, so the pool is pinned to a single connection that never expires
    if url.contains(":memory:") {
        options = options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    } else {
        options = options.max_connections(config.max_connections);
    }

    let pool = options.connect(&url).await?;
    ping(&pool).await?;

    info!(
        "Connected to database {} (max {} connections)",
        config.describe(),
        config.max_connections
    );
    Ok(pool)
}

/// Statement run on every new connection, if the dialect needs one
fn session_setup_sql(dialect: Dialect, statement_timeout: Duration) -> Option<String> {
    match dialect {
        Dialect::Postgres => Some(format!(
            "SET statement_timeout = {}",
            statement_timeout.as_millis()
        )),
        Dialect::Sqlite => None,
    }
}

/// Liveness check
pub async fn ping(pool: &AnyPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_in_memory() {
        let pool = connect(&DatabaseConfig::from_url("sqlite::memory:"))
            .await
            .expect("in-memory database should open");
        ping(&pool).await.expect("ping should succeed");
    }

    #[test]
    fn test_postgres_sessions_get_statement_timeout() {
        assert_eq!(
            session_setup_sql(Dialect::Postgres, Duration::from_secs(30)).as_deref(),
            Some("SET statement_timeout = 30000")
        );
        assert_eq!(session_setup_sql(Dialect::Sqlite, Duration::from_secs(30)), None);
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let mut config = DatabaseConfig::from_url("sqlite:///nonexistent-dir/songlib/songs.db");
        config.acquire_timeout = Duration::from_secs(1);
        assert!(connect(&config).await.is_err());
    }
}
