//! Remote side of the bot console
//!
//! Provides:
//! - Typed client for the trading-bot configuration REST API
//! - YouTube Data API client and the periodic video feed poller
//! - Daily profit / drawdown analytics for the account dashboard

pub mod analytics;
pub mod api;
pub mod error;
pub mod feed;
pub mod types;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

// Re-exports for convenience
pub use analytics::{analyze, BalanceFloor, DrawdownStatus, RiskAnalysis, RiskLimits, TargetStatus};
pub use api::{BotApi, BotConfigClient, YouTubeClient};
pub use error::{ApiError, ApiResult, FeedError, FeedResult};
pub use feed::{
    default_sources, run_feed_cycle, run_feed_poller, FeedCycle, FeedOptions, FeedSource,
};
pub use types::*;
