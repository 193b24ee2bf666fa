//! Video feed poller: scan channel uploads on a long timer
//!
//! Every cycle resolves each source handle, lists its uploads from the last
//! few days, merges and sorts them newest first, then overwrites the report
//! file. Nothing is remembered between cycles.

use crate::api::youtube::YouTubeClient;
use crate::error::FeedResult;
use crate::types::VideoRecord;
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use persistence::{render_report, ReportEntry, ReportFile};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_LOOKBACK_DAYS: u32 = 3;
pub const DEFAULT_INTERVAL_SECS: u64 = 4 * 60 * 60;
pub const DEFAULT_OUTPUT_PATH: &str = "youtube_videos.txt";

const CANCEL_CHECK_MS: u64 = 500;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A channel to scan. `completed_streams` restricts the search to finished
/// live streams (the channel's streams tab) instead of regular uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub handle: String,
    pub completed_streams: bool,
}

impl FeedSource {
    pub fn videos(handle: &str) -> Self {
        Self {
            handle: handle.to_string(),
            completed_streams: false,
        }
    }

    pub fn streams(handle: &str) -> Self {
        Self {
            handle: handle.to_string(),
            completed_streams: true,
        }
    }
}

/// Parses `handle`, `handle:videos` or `handle:streams`
impl FromStr for FeedSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (handle, kind) = match s.trim().split_once(':') {
            Some((handle, kind)) => (handle.trim(), kind.trim()),
            None => (s.trim(), "videos"),
        };
        if handle.is_empty() {
            return Err(format!("empty channel handle in '{}'", s));
        }
        match kind.to_lowercase().as_str() {
            "videos" | "" => Ok(Self::videos(handle)),
            "streams" => Ok(Self::streams(handle)),
            other => Err(format!("unknown source kind '{}' (use videos or streams)", other)),
        }
    }
}

pub fn default_sources() -> Vec<FeedSource> {
    vec![FeedSource::streams("SeanLe714"), FeedSource::videos("rfavietnamese")]
}

/// Poller settings
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub lookback_days: u32,
    pub interval: Duration,
    /// Run a single cycle and return
    pub once: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            once: false,
        }
    }
}

/// Result of one scan
#[derive(Debug, Clone)]
pub struct FeedCycle {
    pub scanned_at: NaiveDateTime,
    pub lookback_days: u32,
    pub videos: Vec<VideoRecord>,
}

impl FeedCycle {
    pub fn report_entries(&self) -> Vec<ReportEntry> {
        self.videos
            .iter()
            .map(|v| ReportEntry {
                title: v.title.clone(),
                date: v.published_at.date_naive(),
                link: v.url.clone(),
                source: v.source.clone(),
            })
            .collect()
    }

    /// Console rendering: the report text plus a closing marker
    pub fn render(&self) -> String {
        let mut text = render_report(self.scanned_at, self.lookback_days, &self.report_entries());
        text.push_str("--- Scan complete ---\n");
        text
    }
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Merge per-source batches: newest first, one entry per link
pub fn merge_videos(batches: Vec<Vec<VideoRecord>>) -> Vec<VideoRecord> {
    let mut all: Vec<VideoRecord> = batches.into_iter().flatten().collect();
    all.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let mut seen = HashSet::new();
    all.retain(|v| seen.insert(v.url.clone()));
    all
}

/// Scan every source. A source that fails to resolve or list is skipped.
pub async fn scan_sources(
    client: &YouTubeClient,
    sources: &[FeedSource],
    cutoff: DateTime<Utc>,
) -> Vec<VideoRecord> {
    let mut batches = Vec::with_capacity(sources.len());

    for source in sources {
        let channel_id = match client.resolve_channel_id(&source.handle).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!(handle = %source.handle, "No channel found for handle, skipping");
                continue;
            }
            Err(e) => {
                warn!(handle = %source.handle, error = %e, "Channel lookup failed, skipping");
                continue;
            }
        };

        match client
            .list_videos(&channel_id, &source.handle, cutoff, source.completed_streams)
            .await
        {
            Ok(videos) => batches.push(videos),
            Err(e) => warn!(handle = %source.handle, error = %e, "Video search failed, skipping"),
        }
    }

    merge_videos(batches)
}

/// Run one cycle: scan, then overwrite the report file
pub async fn run_feed_cycle(
    client: &YouTubeClient,
    sources: &[FeedSource],
    report: &ReportFile,
    lookback_days: u32,
) -> FeedResult<FeedCycle> {
    let cutoff = Utc::now() - chrono::Duration::days(i64::from(lookback_days));
    let videos = scan_sources(client, sources, cutoff).await;

    let cycle = FeedCycle {
        scanned_at: Local::now().naive_local(),
        lookback_days,
        videos,
    };
    report
        .overwrite(cycle.scanned_at, lookback_days, &cycle.report_entries())
        .await?;

    info!(videos = cycle.videos.len(), path = %report.path().display(), "Feed cycle complete");
    Ok(cycle)
}

// ---------------------------------------------------------------------------
// Poller loop
// ---------------------------------------------------------------------------

/// Resolves once `cancelled` is set, checking every half second
async fn cancellation(cancelled: &AtomicBool) {
    while !cancelled.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(CANCEL_CHECK_MS)).await;
    }
}

/// Poll forever (or once), handing each finished cycle to `on_cycle`.
/// Returns when `cancelled` is set, within half a second even mid-scan.
/// An interrupted cycle is dropped and the report keeps the previous scan.
pub async fn run_feed_poller<F>(
    client: &YouTubeClient,
    sources: &[FeedSource],
    report: &ReportFile,
    options: &FeedOptions,
    cancelled: &AtomicBool,
    mut on_cycle: F,
) where
    F: FnMut(&FeedCycle),
{
    info!(
        sources = sources.len(),
        interval_secs = options.interval.as_secs(),
        lookback_days = options.lookback_days,
        "Video feed poller starting"
    );

    loop {
        if cancelled.load(Ordering::Relaxed) {
            break;
        }

        let result = tokio::select! {
            result = run_feed_cycle(client, sources, report, options.lookback_days) => result,
            _ = cancellation(cancelled) => {
                info!("Feed cycle interrupted");
                break;
            }
        };
        match result {
            Ok(cycle) => on_cycle(&cycle),
            Err(e) => error!(error = %e, "Feed cycle failed"),
        }

        if options.once {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(options.interval) => {}
            _ = cancellation(cancelled) => break,
        }
    }

    info!("Video feed poller stopped");
}
