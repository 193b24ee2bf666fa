//! Fake YouTube Data API (channels + search)

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct FakeVideo {
    pub id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    /// Shows up for `eventType=completed` searches
    pub completed_stream: bool,
}

#[derive(Default)]
struct VideoState {
    page_size: usize,
    channels: HashMap<String, String>,
    videos: HashMap<String, Vec<FakeVideo>>,
    search_requests: usize,
    fail_search: bool,
}

type Shared = Arc<Mutex<VideoState>>;

async fn channels(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let st = state.lock().unwrap();
    let handle = params.get("forHandle").cloned().unwrap_or_default();
    let items: Vec<Value> = st
        .channels
        .get(handle.trim_start_matches('@'))
        .map(|id| json!({"kind": "youtube#channel", "id": id}))
        .into_iter()
        .collect();
    Json(json!({"kind": "youtube#channelListResponse", "items": items}))
}

async fn search(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let mut st = state.lock().unwrap();
    st.search_requests += 1;

    if st.fail_search {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": {"code": 403, "message": "quotaExceeded"}})),
        );
    }

    let channel_id = params.get("channelId").cloned().unwrap_or_default();
    let after = params
        .get("publishedAfter")
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc));
    let completed_only = params.get("eventType").map(String::as_str) == Some("completed");
    let offset: usize = params
        .get("pageToken")
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);

    let mut matching: Vec<&FakeVideo> = st
        .videos
        .get(&channel_id)
        .map(|v| v.iter().collect())
        .unwrap_or_default();
    matching.retain(|v| after.map_or(true, |a| v.published_at > a));
    matching.retain(|v| !completed_only || v.completed_stream);
    matching.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let end = (offset + st.page_size).min(matching.len());
    let items: Vec<Value> = matching[offset.min(end)..end]
        .iter()
        .map(|v| {
            json!({
                "kind": "youtube#searchResult",
                "id": {"kind": "youtube#video", "videoId": v.id},
                "snippet": {
                    "title": v.title,
                    "publishedAt": v.published_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                }
            })
        })
        .collect();

    let mut body = json!({"kind": "youtube#searchListResponse", "items": items});
    if end < matching.len() {
        body["nextPageToken"] = json!(end.to_string());
    }
    (StatusCode::OK, Json(body))
}

/// Running fake video API; aborted on drop
pub struct FakeVideoServer {
    base_url: String,
    state: Shared,
    handle: JoinHandle<()>,
}

impl FakeVideoServer {
    /// Start with the given search page size
    pub async fn start(page_size: usize) -> Self {
        let state: Shared = Arc::new(Mutex::new(VideoState {
            page_size: page_size.max(1),
            ..VideoState::default()
        }));

        let app = Router::new()
            .route("/youtube/v3/channels", get(channels))
            .route("/youtube/v3/search", get(search))
            .with_state(state.clone());

        let (listener, base_url) = super::bind_local().await;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            base_url,
            state,
            handle,
        }
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn add_channel(&self, handle: &str, channel_id: &str, videos: Vec<FakeVideo>) {
        let mut st = self.state.lock().unwrap();
        st.channels.insert(handle.to_string(), channel_id.to_string());
        st.videos.insert(channel_id.to_string(), videos);
    }

    pub fn fail_search(&self, fail: bool) {
        self.state.lock().unwrap().fail_search = fail;
    }

    pub fn search_requests(&self) -> usize {
        self.state.lock().unwrap().search_requests
    }
}

impl Drop for FakeVideoServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
