//! Enrichment service client
//!
//! Looks up release date, lyrics and link for a group/title pair with one
//! `GET {base_url}/info?group=..&song=..` per call. No retries, no caching.

use songlib_common::config::EnrichmentConfig;
use songlib_common::SongDetail;
use thiserror::Error;

const USER_AGENT: &str = concat!("songlib-api/", env!("CARGO_PKG_VERSION"));

/// Enrichment client errors
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// Transport failure, timeout, or non-success status
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Response body is not a valid song detail object
    #[error("Decode error: {0}")]
    Decode(String),
}

/// HTTP client for the external lookup service
#[derive(Debug, Clone)]
pub struct EnrichmentClient {
    http_client: reqwest::Client,
    info_url: String,
}

impl EnrichmentClient {
    pub fn new(config: &EnrichmentConfig) -> Result<Self, EnrichmentError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| EnrichmentError::Upstream(e.to_string()))?;

        Ok(Self {
            http_client,
            info_url: format!("{}/info", config.base_url.trim_end_matches('/')),
        })
    }

    /// Fetch metadata for one song
    pub async fn fetch_song_detail(
        &self,
        group: &str,
        song: &str,
    ) -> Result<SongDetail, EnrichmentError> {
        tracing::debug!(url = %self.info_url, group = %group, song = %song, "Querying enrichment service");

        let response = self
            .http_client
            .get(&self.info_url)
            .query(&[("group", group), ("song", song)])
            .send()
            .await
            .map_err(|e| EnrichmentError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentError::Upstream(format!(
                "enrichment service returned {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| EnrichmentError::Upstream(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| EnrichmentError::Decode(e.to_string()))
    }
}
