//! YouTube Data API v3 catalog client.

use super::PlaylistCatalog;
use crate::error::{ClipdexError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Page size for `playlistItems` requests (API maximum).
const MAX_RESULTS: &str = "50";

/// Default timeout for catalog requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Playlist and video lookups against the YouTube Data API.
pub struct YoutubeDataClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YoutubeDataClient {
    /// Create a client authenticated with an API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: API_BASE.to_string(),
        })
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, resource);

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClipdexError::PlaylistSource(format!(
                "{} request failed ({}): {}",
                resource, status, body
            )));
        }

        Ok(response.json::<T>().await?)
    }

    async fn first_title(&self, resource: &str, id: &str) -> Result<String> {
        let response: ListResponse<TitledItem> =
            self.get(resource, &[("part", "snippet"), ("id", id)]).await?;

        response
            .items
            .into_iter()
            .next()
            .map(|item| item.snippet.title)
            .ok_or_else(|| ClipdexError::PlaylistSource(format!("No {} found with id {}", resource, id)))
    }
}

#[async_trait]
impl PlaylistCatalog for YoutubeDataClient {
    #[instrument(skip(self))]
    async fn playlist_title(&self, playlist_id: &str) -> Result<String> {
        self.first_title("playlists", playlist_id).await
    }

    #[instrument(skip(self))]
    async fn playlist_video_ids(&self, playlist_id: &str) -> Result<Vec<String>> {
        let mut video_ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("part", "snippet"),
                ("playlistId", playlist_id),
                ("maxResults", MAX_RESULTS),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let page: ListResponse<PlaylistItem> = self.get("playlistItems", &params).await?;
            video_ids.extend(page.items.into_iter().filter_map(|item| item.snippet.resource_id.video_id));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Found {} videos in playlist {}", video_ids.len(), playlist_id);
        Ok(video_ids)
    }

    #[instrument(skip(self))]
    async fn video_title(&self, video_id: &str) -> Result<String> {
        self.first_title("videos", video_id).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TitledItem {
    snippet: TitleSnippet,
}

#[derive(Debug, Deserialize)]
struct TitleSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}
