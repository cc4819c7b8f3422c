//! Song store
//!
//! Every operation is a single parameterized statement, so each runs in its
//! own implicit transaction. Placeholders use the `$N` form, which both
//! PostgreSQL and SQLite accept.
//!
//! Each searchable column has a `*_folded` twin holding its lowercased form.
//! The store writes both on insert and update; list filters match against the
//! twins only. SQLite's `LOWER` folds ASCII alone, so folding happens here.

use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use tracing::debug;

use crate::db::models::{NewSong, Song, SongDetail, SongFilter, SongUpdate};
use crate::Result;

const SONG_COLUMNS: &str = "id, group_name, song_title, release_date, text, link";

/// Handle to the `songs` table
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct SongStore {
    pool: AnyPool,
}

impl SongStore {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Insert an enriched song and return it with its assigned id
    pub async fn insert(&self, new_song: &NewSong, detail: &SongDetail) -> Result<Song> {
        let sql = format!(
            "INSERT INTO songs (group_name, song_title, release_date, text, link, \
             group_name_folded, song_title_folded, release_date_folded, text_folded, link_folded) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            SONG_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(new_song.group.as_str())
            .bind(new_song.song.as_str())
            .bind(detail.release_date.as_str())
            .bind(detail.text.as_str())
            .bind(detail.link.as_str())
            .bind(fold_case(&new_song.group))
            .bind(fold_case(&new_song.song))
            .bind(fold_case(&detail.release_date))
            .bind(fold_case(&detail.text))
            .bind(fold_case(&detail.link))
            .fetch_one(&self.pool)
            .await?;

        Ok(song_from_row(&row)?)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Song>> {
        let sql = format!("SELECT {} FROM songs WHERE id = $1", SONG_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(song_from_row).transpose()?)
    }

    /// Songs matching `filter`, ordered by id
    pub async fn list(&self, filter: &SongFilter) -> Result<Vec<Song>> {
        let mut sql = format!("SELECT {} FROM songs", SONG_COLUMNS);
        let mut patterns = Vec::new();
        let mut conditions = Vec::new();

        for (column, needle) in filter.text_constraints() {
            patterns.push(like_pattern(&fold_case(needle)));
            conditions.push(format!(
                "{}_folded LIKE ${} ESCAPE '\\'",
                column,
                patterns.len()
            ));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY id");

        if filter.page.is_some() {
            sql.push_str(&format!(
                " LIMIT ${} OFFSET ${}",
                patterns.len() + 1,
                patterns.len() + 2
            ));
        }

        debug!(sql = %sql, "Listing songs");

        let mut query = sqlx::query(&sql);
        for pattern in &patterns {
            query = query.bind(pattern.as_str());
        }
        if let Some(window) = filter.page {
            query = query.bind(window.limit).bind(window.offset);
        }

        let rows = query.fetch_all(&self.pool).await?;
        let songs = rows
            .iter()
            .map(song_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(songs)
    }

    /// Replace every mutable column; `None` when no song has this id
    pub async fn update(&self, id: i64, update: &SongUpdate) -> Result<Option<Song>> {
        let sql = format!(
            "UPDATE songs SET group_name = $1, song_title = $2, release_date = $3, \
             text = $4, link = $5, group_name_folded = $6, song_title_folded = $7, \
             release_date_folded = $8, text_folded = $9, link_folded = $10 \
             WHERE id = $11 RETURNING {}",
            SONG_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(update.group.as_str())
            .bind(update.song.as_str())
            .bind(update.release_date.as_str())
            .bind(update.text.as_str())
            .bind(update.link.as_str())
            .bind(fold_case(&update.group))
            .bind(fold_case(&update.song))
            .bind(fold_case(&update.release_date))
            .bind(fold_case(&update.text))
            .bind(fold_case(&update.link))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(song_from_row).transpose()?)
    }

    /// Returns false when no song has this id
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM songs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of stored songs
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn song_from_row(row: &AnyRow) -> std::result::Result<Song, sqlx::Error> {
    Ok(Song {
        id: row.try_get("id")?,
        group: row.try_get("group_name")?,
        song: row.try_get("song_title")?,
        release_date: row.try_get("release_date")?,
        text: row.try_get("text")?,
        link: row.try_get("link")?,
    })
}

/// Case-folded form stored in the `*_folded` columns and used for filter needles
pub(crate) fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// `%needle%` with LIKE wildcards in `needle` escaped
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
