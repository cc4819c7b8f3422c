//! Song CRUD endpoints
//!
//! Each handler is a single linear pass: decode request, (create only) call
//! the enrichment service, run one store statement, encode the response.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use songlib_common::{NewSong, Song, SongFilter, SongUpdate};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::pagination::calculate_window;
use crate::AppState;

/// Query parameters for listing songs
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub group: Option<String>,
    pub song: Option<String>,
    pub release_date: Option<String>,
    pub text: Option<String>,
    pub link: Option<String>,
    /// Page number (1-indexed)
    pub page: Option<i64>,
    /// Page size
    pub limit: Option<i64>,
}

impl ListQuery {
    fn into_filter(self) -> SongFilter {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        SongFilter {
            page: calculate_window(self.page, self.limit),
            group: non_empty(self.group),
            song: non_empty(self.song),
            release_date: non_empty(self.release_date),
            text: non_empty(self.text),
            link: non_empty(self.link),
        }
    }
}

fn song_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::BadInput(e.body_text()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::BadInput(e.body_text()))
}

/// POST /songs
///
/// Enriches `{group, song}` from the external service and stores the result.
pub async fn create_song(
    State(state): State<AppState>,
    body: Result<Json<NewSong>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Song>)> {
    let new_song = json_body(body)?;
    new_song.validate()?;

    let detail = state
        .enrichment
        .fetch_song_detail(&new_song.group, &new_song.song)
        .await?;

    let song = state.store.insert(&new_song, &detail).await?;
    info!(id = song.id, group = %song.group, song = %song.song, "Song created");

    Ok((StatusCode::CREATED, Json(song)))
}

/// DELETE /songs/:id
pub async fn delete_song(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = song_id(path)?;

    if !state.store.delete(id).await? {
        return Err(ApiError::NotFound(id));
    }

    info!(id, "Song deleted");
    Ok(StatusCode::OK)
}

/// GET /songs/:id
pub async fn get_song(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Song>> {
    let id = song_id(path)?;

    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

/// PUT /songs/:id
///
/// Full replacement; every field is required.
pub async fn update_song(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<SongUpdate>, JsonRejection>,
) -> ApiResult<Json<Song>> {
    let id = song_id(path)?;
    let update = json_body(body)?;
    update.validate()?;

    let song = state
        .store
        .update(id, &update)
        .await?
        .ok_or(ApiError::NotFound(id))?;

    info!(id, "Song updated");
    Ok(Json(song))
}

/// GET /songs
///
/// Optional case-insensitive substring filters on every field, plus
/// `page`/`limit` paging. Without query parameters returns every song.
pub async fn list_songs(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Song>>> {
    let Query(query) = query.map_err(|e| ApiError::BadInput(e.body_text()))?;
    let songs = state.store.list(&query.into_filter()).await?;
    Ok(Json(songs))
}
