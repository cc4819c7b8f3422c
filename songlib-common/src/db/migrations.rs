//! Database schema migrations
//!
//! Versioned, idempotent schema migrations tracked in the `schema_version`
//! table. Startup applies every migration newer than the recorded version;
//! a failure aborts startup.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - deployed databases have already run them
//! 2. **Always add new migrations** - one function per schema change
//! 3. **Keep them idempotent** - `IF NOT EXISTS` everywhere
//! 4. **Mind both dialects** - DDL goes through [`Dialect`]

use chrono::Utc;
use sqlx::{AnyPool, Row};
use tracing::{info, warn};

use crate::db::songs::fold_case;
use crate::db::Dialect;
use crate::Result;

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i64 = 3;

async fn create_schema_version_table(pool: &AnyPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version BIGINT PRIMARY KEY,
            applied_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Get current schema version from database (0 when nothing was applied)
pub async fn get_schema_version(pool: &AnyPool) -> Result<i64> {
    let version: i64 =
        sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
            .fetch_one(pool)
            .await?;

    Ok(version)
}

async fn set_schema_version(pool: &AnyPool, version: i64) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES ($1, $2)")
        .bind(version)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &AnyPool, dialect: Dialect) -> Result<()> {
    create_schema_version_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool, dialect).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    if current_version < 3 {
        migrate_v3(pool, dialect).await?;
        set_schema_version(pool, 3).await?;
        info!("✓ Migration v3 completed");
    }

    info!("All migrations completed successfully");
    Ok(())
}

/// Migration v1: songs table
async fn migrate_v1(pool: &AnyPool, dialect: Dialect) -> Result<()> {
    info!("Running migration v1: Create songs table");

    let id_column = match dialect {
        Dialect::Postgres => "id BIGSERIAL PRIMARY KEY",
        Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
    };

    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            {},
            group_name TEXT NOT NULL,
            song_title TEXT NOT NULL,
            release_date TEXT NOT NULL,
            text TEXT NOT NULL,
            link TEXT NOT NULL
        )
        "#,
        id_column
    );

    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}

/// Migration v2: index for group/title lookups
async fn migrate_v2(pool: &AnyPool) -> Result<()> {
    info!("Running migration v2: Index songs by group and title");

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_songs_group_title ON songs (group_name, song_title)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Searchable columns and their case-folded twins
const FOLDED_COLUMNS: [(&str, &str); 5] = [
    ("group_name", "group_name_folded"),
    ("song_title", "song_title_folded"),
    ("release_date", "release_date_folded"),
    ("text", "text_folded"),
    ("link", "link_folded"),
];

async fn column_exists(pool: &AnyPool, dialect: Dialect, table: &str, column: &str) -> Result<bool> {
    let sql = match dialect {
        Dialect::Postgres => format!(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_name = '{}' AND column_name = '{}'",
            table, column
        ),
        Dialect::Sqlite => format!(
            "SELECT COUNT(*) FROM pragma_table_info('{}') WHERE name = '{}'",
            table, column
        ),
    };

    let count: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(count > 0)
}

/// Migration v3: case-folded copies of the searchable columns
///
/// SQLite's `LOWER` only folds ASCII, so filters on non-Latin text never
/// matched across case. Folded values are computed by the store and
/// backfilled here for existing rows.
async fn migrate_v3(pool: &AnyPool, dialect: Dialect) -> Result<()> {
    info!("Running migration v3: Add case-folded search columns");

    let mut added_count = 0;
    for (_, folded) in FOLDED_COLUMNS {
        if column_exists(pool, dialect, "songs", folded).await? {
            continue;
        }
        sqlx::query(&format!(
            "ALTER TABLE songs ADD COLUMN {} TEXT NOT NULL DEFAULT ''",
            folded
        ))
        .execute(pool)
        .await?;
        added_count += 1;
    }
    info!("  ✓ Added {} folded columns to songs table", added_count);

    let rows = sqlx::query("SELECT id, group_name, song_title, release_date, text, link FROM songs")
        .fetch_all(pool)
        .await?;

    for row in &rows {
        let id: i64 = row.try_get("id")?;
        let mut update = sqlx::query(
            "UPDATE songs SET group_name_folded = $1, song_title_folded = $2, \
             release_date_folded = $3, text_folded = $4, link_folded = $5 WHERE id = $6",
        );
        for (column, _) in FOLDED_COLUMNS {
            let value: String = row.try_get(column)?;
            update = update.bind(fold_case(&value));
        }
        update.bind(id).execute(pool).await?;
    }

    if !rows.is_empty() {
        info!("  ✓ Backfilled folded columns for {} songs", rows.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::connect;

    #[tokio::test]
    async fn test_v3_backfills_rows_written_before_it() {
        let pool = connect(&DatabaseConfig::from_url("sqlite::memory:"))
            .await
            .unwrap();
        create_schema_version_table(&pool).await.unwrap();
        migrate_v1(&pool, Dialect::Sqlite).await.unwrap();
        migrate_v2(&pool).await.unwrap();
        set_schema_version(&pool, 1).await.unwrap();
        set_schema_version(&pool, 2).await.unwrap();

        sqlx::query(
            "INSERT INTO songs (group_name, song_title, release_date, text, link) \
             VALUES ('Кино', 'Группа крови', '1988', 'Тёплое место', 'http://x')",
        )
        .execute(&pool)
        .await
        .unwrap();

        run_migrations(&pool, Dialect::Sqlite).await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);

        let folded: String = sqlx::query_scalar("SELECT group_name_folded FROM songs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(folded, "кино");
    }

    #[tokio::test]
    async fn test_v3_skips_existing_columns() {
        let pool = connect(&DatabaseConfig::from_url("sqlite::memory:"))
            .await
            .unwrap();
        run_migrations(&pool, Dialect::Sqlite).await.unwrap();

        migrate_v3(&pool, Dialect::Sqlite)
            .await
            .expect("Re-running v3 should not re-add columns");
        assert!(column_exists(&pool, Dialect::Sqlite, "songs", "link_folded").await.unwrap());
    }
}
