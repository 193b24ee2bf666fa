//! YouTube Data API v3 client: channel lookup and upload search
//!
//! Only two public endpoints are used, authenticated with an API key:
//! `channels?forHandle=` to resolve a handle, and `search` to list uploads.

use crate::error::{FeedError, FeedResult};
use crate::types::VideoRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Maximum page size accepted by the search endpoint
pub const SEARCH_PAGE_SIZE: u32 = 50;

/// YouTube public data client
#[derive(Clone)]
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

// ---------------------------------------------------------------------------
// Deserialization structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    published_at: DateTime<Utc>,
}

/// One page of search results
#[derive(Debug)]
pub struct SearchPage {
    pub videos: Vec<VideoRecord>,
    pub next_page_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Client implementation
// ---------------------------------------------------------------------------

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> FeedResult<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()?,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Point the client at another host (proxy or test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> FeedResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if status != StatusCode::OK {
            return Err(FeedError::Status {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Resolve a channel handle (`@name` or `name`) to its channel ID.
    /// Returns `None` when the API knows no such handle.
    pub async fn resolve_channel_id(&self, handle: &str) -> FeedResult<Option<String>> {
        debug!(handle, "Resolving channel handle");
        let params = [("part", "id".to_string()), ("forHandle", handle.to_string())];

        let resp: ChannelListResponse = self.get_json("/youtube/v3/channels", &params).await?;
        Ok(resp.items.into_iter().next().map(|item| item.id))
    }

    /// Fetch one page of a channel's uploads published after `published_after`
    pub async fn search_page(
        &self,
        channel_id: &str,
        source: &str,
        published_after: DateTime<Utc>,
        completed_streams: bool,
        page_token: Option<&str>,
    ) -> FeedResult<SearchPage> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("channelId", channel_id.to_string()),
            ("order", "date".to_string()),
            ("type", "video".to_string()),
            (
                "publishedAfter",
                published_after.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("maxResults", SEARCH_PAGE_SIZE.to_string()),
        ];
        if completed_streams {
            params.push(("eventType", "completed".to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let resp: SearchResponse = self.get_json("/youtube/v3/search", &params).await?;

        let videos = resp
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(VideoRecord {
                    published_at: item.snippet.published_at,
                    title: item.snippet.title,
                    url: format!("{}{}", WATCH_URL, video_id),
                    source: source.to_string(),
                })
            })
            .collect();

        Ok(SearchPage {
            videos,
            next_page_token: resp.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    /// List every upload after `published_after`, following page tokens
    pub async fn list_videos(
        &self,
        channel_id: &str,
        source: &str,
        published_after: DateTime<Utc>,
        completed_streams: bool,
    ) -> FeedResult<Vec<VideoRecord>> {
        let mut all_videos = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .search_page(
                    channel_id,
                    source,
                    published_after,
                    completed_streams,
                    page_token.as_deref(),
                )
                .await?;
            all_videos.extend(page.videos);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(source, count = all_videos.len(), "Channel uploads fetched");
        Ok(all_videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{FakeVideo, FakeVideoServer};
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn video(id: &str, day: u32, completed_stream: bool) -> FakeVideo {
        FakeVideo {
            id: id.into(),
            title: format!("Video {id}"),
            published_at: at(day, 12),
            completed_stream,
        }
    }

    #[tokio::test]
    async fn test_resolve_known_and_unknown_handles() {
        let server = FakeVideoServer::start(1).await;
        server.add_channel("SeanLe714", "UC_sean", vec![]);
        let client = YouTubeClient::new("test-key").unwrap().with_base_url(server.url());

        assert_eq!(
            client.resolve_channel_id("SeanLe714").await.unwrap().as_deref(),
            Some("UC_sean")
        );
        assert_eq!(client.resolve_channel_id("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_videos_follows_pages_and_cutoff() {
        let server = FakeVideoServer::start(2).await;
        server.add_channel(
            "rfavietnamese",
            "UC_rfa",
            vec![
                video("a", 5, false),
                video("b", 4, false),
                video("c", 3, false),
                video("old", 1, false),
            ],
        );
        let client = YouTubeClient::new("test-key").unwrap().with_base_url(server.url());

        let videos = client
            .list_videos("UC_rfa", "rfavietnamese", at(2, 0), false)
            .await
            .unwrap();

        let ids: Vec<&str> = videos.iter().map(|v| v.url.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "https://www.youtube.com/watch?v=a",
                "https://www.youtube.com/watch?v=b",
                "https://www.youtube.com/watch?v=c",
            ]
        );
        assert!(videos.iter().all(|v| v.source == "rfavietnamese"));
        // three matches with two per page
        assert_eq!(server.search_requests(), 2);
    }

    #[tokio::test]
    async fn test_completed_streams_filter() {
        let server = FakeVideoServer::start(50).await;
        server.add_channel(
            "SeanLe714",
            "UC_sean",
            vec![video("live", 4, true), video("upload", 4, false)],
        );
        let client = YouTubeClient::new("test-key").unwrap().with_base_url(server.url());

        let videos = client
            .list_videos("UC_sean", "SeanLe714", at(2, 0), true)
            .await
            .unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].title, "Video live");
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let server = FakeVideoServer::start(50).await;
        server.fail_search(true);
        server.add_channel("SeanLe714", "UC_sean", vec![]);
        let client = YouTubeClient::new("test-key").unwrap().with_base_url(server.url());

        let err = client
            .list_videos("UC_sean", "SeanLe714", at(2, 0), false)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Status { status: 403, .. }));
    }
}
