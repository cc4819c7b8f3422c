//! HTTP API handlers for songlib-api

pub mod buildinfo;
pub mod health;
pub mod songs;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use songs::{create_song, delete_song, get_song, list_songs, update_song};
