//! video-feed: write recent channel uploads to a text file on a timer
//!
//! Usage:
//!   video-feed                                  # default sources, every 4 hours
//!   video-feed --once --output feed.txt         # single scan
//!   video-feed --sources SeanLe714:streams,rfavietnamese

use anyhow::Context;
use clap::Parser;
use console::{init_logging, APP_VERSION};
use persistence::ReportFile;
use remote::feed::{
    default_sources, run_feed_poller, FeedOptions, FeedSource, DEFAULT_INTERVAL_SECS,
    DEFAULT_LOOKBACK_DAYS, DEFAULT_OUTPUT_PATH,
};
use remote::YouTubeClient;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "video-feed", version = APP_VERSION)]
#[command(about = "Poll channels for new uploads and write them to a text file", long_about = None)]
struct Cli {
    /// Report file, overwritten every cycle
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Seconds between scans
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    interval_secs: u64,

    /// Only report uploads from the last N days
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_DAYS)]
    lookback_days: u32,

    /// Channels as handle[:videos|streams] (comma-separated)
    #[arg(long, value_delimiter = ',')]
    sources: Vec<FeedSource>,

    /// Run a single scan and exit
    #[arg(long)]
    once: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose, "info");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Unexpected error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let api_key = std::env::var("YOUTUBE_API_KEY").context("YOUTUBE_API_KEY is not set")?;
    let mut client = YouTubeClient::new(api_key)?;
    if let Ok(base_url) = std::env::var("YOUTUBE_API_BASE_URL") {
        client = client.with_base_url(base_url);
    }

    let sources = if cli.sources.is_empty() {
        default_sources()
    } else {
        cli.sources
    };
    let report = ReportFile::new(&cli.output)?;
    let options = FeedOptions {
        lookback_days: cli.lookback_days,
        interval: Duration::from_secs(cli.interval_secs),
        once: cli.once,
    };

    println!("\n=== Video Feed v{} ===", APP_VERSION);
    for source in &sources {
        let kind = if source.completed_streams { "streams" } else { "videos" };
        println!("  @{} ({})", source.handle, kind);
    }
    println!("Output: {}", report.path().display());
    if !options.once {
        println!("Scanning every {}s. Press Ctrl+C to stop", options.interval.as_secs());
    }
    println!();

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl+C received, stopping...");
        flag.store(true, Ordering::Relaxed);
    });

    run_feed_poller(&client, &sources, &report, &options, &cancelled, |cycle| {
        println!("{}", cycle.render());
    })
    .await;

    if cancelled.load(Ordering::Relaxed) {
        println!("👋 Goodbye!");
    }
    Ok(())
}
