//! # SongLib Common Library
//!
//! Shared code for the SongLib service crates:
//! - Song entity and request payload types
//! - Database connection, migrations and the song store
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use db::models::{NewSong, PageWindow, Song, SongDetail, SongFilter, SongUpdate};
pub use error::{Error, Result};
