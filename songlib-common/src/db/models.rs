//! Song entity and payload types
//!
//! JSON field names follow the public HTTP contract:
//! `id`, `group`, `song`, `releaseDate`, `text`, `link`.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A stored song record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// Identifier assigned by the store on insert
    pub id: i64,
    /// Group (artist) name
    pub group: String,
    /// Song title
    pub song: String,
    /// Release date, free-form as returned by the enrichment service
    pub release_date: String,
    /// Lyrics, possibly multi-line
    pub text: String,
    /// External link
    pub link: String,
}

/// Body of a create request
///
/// Only `group` and `song` are read; any other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSong {
    pub group: String,
    pub song: String,
}

impl NewSong {
    pub fn validate(&self) -> Result<()> {
        require_non_blank("group", &self.group)?;
        require_non_blank("song", &self.song)
    }
}

/// Full replacement body of an update request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongUpdate {
    pub group: String,
    pub song: String,
    pub release_date: String,
    pub text: String,
    pub link: String,
}

impl SongUpdate {
    pub fn validate(&self) -> Result<()> {
        require_non_blank("group", &self.group)?;
        require_non_blank("song", &self.song)
    }
}

/// Metadata returned by the enrichment service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDetail {
    pub release_date: String,
    pub text: String,
    pub link: String,
}

/// LIMIT/OFFSET window for a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

/// Optional constraints for listing songs
///
/// Text constraints are case-insensitive substring matches. `None` everywhere
/// lists the whole table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongFilter {
    pub group: Option<String>,
    pub song: Option<String>,
    pub release_date: Option<String>,
    pub text: Option<String>,
    pub link: Option<String>,
    pub page: Option<PageWindow>,
}

impl SongFilter {
    /// (column, needle) pairs for every text constraint that is set
    pub fn text_constraints(&self) -> Vec<(&'static str, &str)> {
        [
            ("group_name", &self.group),
            ("song_title", &self.song),
            ("release_date", &self.release_date),
            ("text", &self.text),
            ("link", &self.link),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.as_deref().map(|v| (column, v)))
        .collect()
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("field '{}' must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn song_serializes_with_public_field_names() {
        let song = Song {
            id: 7,
            group: "Muse".to_string(),
            song: "Supermassive Black Hole".to_string(),
            release_date: "16.07.2006".to_string(),
            text: "Ooh baby, don't you know I suffer?".to_string(),
            link: "https://www.youtube.com/watch?v=Xsp3_a-PMTw".to_string(),
        };

        let value = serde_json::to_value(&song).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["group"], "Muse");
        assert_eq!(value["song"], "Supermassive Black Hole");
        assert_eq!(value["releaseDate"], "16.07.2006");
        assert!(value.get("release_date").is_none());
    }

    #[test]
    fn new_song_ignores_extra_fields() {
        let new_song: NewSong = serde_json::from_str(
            r#"{"group": "G", "song": "S", "releaseDate": "ignored", "id": 99}"#,
        )
        .unwrap();
        assert_eq!(new_song.group, "G");
        assert_eq!(new_song.song, "S");
    }

    #[test]
    fn new_song_requires_group_and_song() {
        assert!(serde_json::from_str::<NewSong>(r#"{"group": "G"}"#).is_err());
        assert!(serde_json::from_str::<NewSong>(r#"{"song": "S"}"#).is_err());
    }

    #[test]
    fn blank_names_fail_validation() {
        let new_song = NewSong {
            group: "  ".to_string(),
            song: "S".to_string(),
        };
        assert!(matches!(new_song.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn song_update_requires_every_field() {
        let missing_link = r#"{"group": "G", "song": "S", "releaseDate": "d", "text": "t"}"#;
        assert!(serde_json::from_str::<SongUpdate>(missing_link).is_err());
    }

    #[test]
    fn song_detail_rejects_missing_text() {
        let body = r#"{"releaseDate": "2006-01-01", "link": "http://x"}"#;
        assert!(serde_json::from_str::<SongDetail>(body).is_err());
    }

    #[test]
    fn text_constraints_only_lists_set_fields() {
        let filter = SongFilter {
            group: Some("mu".to_string()),
            link: Some("youtube".to_string()),
            ..Default::default()
        };
        assert_eq!(
            filter.text_constraints(),
            vec![("group_name", "mu"), ("link", "youtube")]
        );
    }
}
