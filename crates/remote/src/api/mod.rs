//! API clients

pub mod config;
pub mod youtube;

pub use config::BotConfigClient;
pub use youtube::YouTubeClient;

use crate::error::ApiResult;
use crate::types::{AccountSnapshot, ConfigBundle, StrategyParams, StrategyStatus};
use async_trait::async_trait;

/// Operations of the remote trading-bot config API.
///
/// Each call performs exactly one HTTP request. Failures come back as
/// `Err(ApiError)`; nothing is retried here.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Server address the client talks to
    fn base_url(&self) -> &str;

    /// GET /api/health: succeeds only for `{"status": "healthy"}`
    async fn health_check(&self) -> ApiResult<()>;

    /// GET /api/config
    async fn get_all_config(&self) -> ApiResult<ConfigBundle>;

    /// PUT /api/config/settings
    async fn update_setting(&self, key: &str, value: &str) -> ApiResult<()>;

    /// PUT /api/config/strategies
    async fn update_strategy(&self, name: &str, status: &StrategyStatus) -> ApiResult<()>;

    /// PUT /api/config/strategy-config
    async fn update_strategy_config(&self, name: &str, params: &StrategyParams) -> ApiResult<()>;

    /// PUT /api/config/test-settings
    async fn update_test_setting(&self, key: &str, value: &str) -> ApiResult<()>;

    /// POST /api/refresh-bot: returns the server's message
    async fn refresh_bot(&self) -> ApiResult<String>;

    /// GET /api/mt5-account-info
    async fn get_account_info(&self) -> ApiResult<AccountSnapshot>;
}
