//! Trading-bot config API client
//!
//! Thin wrapper over the bot's REST endpoints (`/api/config/*`,
//! `/api/refresh-bot`, `/api/mt5-account-info`). A request only counts as
//! successful on HTTP 200 with a truthy `success` flag in the body.

use super::BotApi;
use crate::error::{ApiError, ApiResult};
use crate::types::{AccountSnapshot, ConfigBundle, StrategyParams, StrategyStatus};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_REFRESH_MESSAGE: &str = "Bot refreshed";

/// Bot config API client bound to one server address
#[derive(Clone)]
pub struct BotConfigClient {
    client: Client,
    base_url: String,
}

// ---------------------------------------------------------------------------
// Wire structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: Option<String>,
}

/// Wrapper: the config endpoint returns `{ "config": {...} }`
#[derive(Debug, Deserialize)]
struct ConfigResponse {
    config: ConfigBundle,
}

/// Acknowledgement returned by every mutating endpoint
#[derive(Debug, Default, Deserialize)]
struct Ack {
    #[serde(default)]
    success: Value,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
struct KeyValueBody<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct StrategyBody<'a> {
    strategy_name: &'a str,
    strategy_type: &'a str,
}

#[derive(Serialize)]
struct StrategyConfigBody<'a> {
    strategy_name: &'a str,
    #[serde(flatten)]
    params: &'a StrategyParams,
}

/// Python-style truthiness of a JSON value
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Pull a human-readable `message` (or `error`) out of an error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Client implementation
// ---------------------------------------------------------------------------

impl BotConfigClient {
    /// Create a client with the default 10 second request timeout
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> ApiResult<Response> {
        request.send().await.map_err(|e| {
            debug!(error = %e, "{} failed: server unreachable", what);
            ApiError::Transport(e)
        })
    }

    /// Decode a 200 body, or turn any other status into `ApiError::Status`
    async fn read_json<T: DeserializeOwned>(resp: Response, what: &str) -> ApiResult<T> {
        let status = resp.status();
        let body = resp.text().await?;

        if status != StatusCode::OK {
            let message = error_message(&body).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("unexpected status").to_string()
            });
            debug!(status = status.as_u16(), "{} returned HTTP error", what);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            debug!(error = %e, "{} returned an undecodable body", what);
            ApiError::Decode(e)
        })
    }

    async fn put_update<B: Serialize + Sync>(&self, path: &str, body: &B, what: &str) -> ApiResult<()> {
        let url = self.url(path);
        debug!(url = %url, "{}", what);

        let resp = self.send(self.client.put(&url).json(body), what).await?;
        let ack: Ack = Self::read_json(resp, what).await?;

        if is_truthy(&ack.success) {
            Ok(())
        } else {
            let message = ack
                .message
                .unwrap_or_else(|| format!("{} was not applied", what));
            debug!(%message, "{} rejected", what);
            Err(ApiError::Rejected(message))
        }
    }
}

#[async_trait]
impl BotApi for BotConfigClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn health_check(&self) -> ApiResult<()> {
        let url = self.url("/api/health");
        debug!(url = %url, "Probing bot server health");

        let resp = self.send(self.client.get(&url), "Health check").await?;
        let health: HealthResponse = Self::read_json(resp, "Health check").await?;

        match health.status.as_deref() {
            Some("healthy") => Ok(()),
            other => Err(ApiError::Unhealthy(other.unwrap_or("missing").to_string())),
        }
    }

    async fn get_all_config(&self) -> ApiResult<ConfigBundle> {
        let url = self.url("/api/config");
        debug!(url = %url, "Fetching config bundle");

        let resp = self.send(self.client.get(&url), "Config fetch").await?;
        let wrapper: ConfigResponse = Self::read_json(resp, "Config fetch").await?;

        debug!(
            settings = wrapper.config.settings.len(),
            strategies = wrapper.config.strategies.len(),
            strategy_configs = wrapper.config.strategy_config.len(),
            test_settings = wrapper.config.test_settings.len(),
            "Config bundle fetched"
        );
        Ok(wrapper.config)
    }

    async fn update_setting(&self, key: &str, value: &str) -> ApiResult<()> {
        self.put_update(
            "/api/config/settings",
            &KeyValueBody { key, value },
            "Setting update",
        )
        .await
    }

    async fn update_strategy(&self, name: &str, status: &StrategyStatus) -> ApiResult<()> {
        let body = StrategyBody {
            strategy_name: name,
            strategy_type: status.as_str(),
        };
        self.put_update("/api/config/strategies", &body, "Strategy update")
            .await
    }

    async fn update_strategy_config(&self, name: &str, params: &StrategyParams) -> ApiResult<()> {
        let body = StrategyConfigBody {
            strategy_name: name,
            params,
        };
        self.put_update("/api/config/strategy-config", &body, "Strategy config update")
            .await
    }

    async fn update_test_setting(&self, key: &str, value: &str) -> ApiResult<()> {
        self.put_update(
            "/api/config/test-settings",
            &KeyValueBody { key, value },
            "Test setting update",
        )
        .await
    }

    async fn refresh_bot(&self) -> ApiResult<String> {
        let url = self.url("/api/refresh-bot");
        debug!(url = %url, "Requesting bot refresh");

        let resp = self.send(self.client.post(&url), "Bot refresh").await?;
        let ack: Ack = Self::read_json(resp, "Bot refresh").await?;

        // Older servers answer 200 without a `success` flag
        if ack.success.is_null() || is_truthy(&ack.success) {
            Ok(ack
                .message
                .unwrap_or_else(|| DEFAULT_REFRESH_MESSAGE.to_string()))
        } else {
            Err(ApiError::Rejected(
                ack.message.unwrap_or_else(|| "Unknown error".to_string()),
            ))
        }
    }

    async fn get_account_info(&self) -> ApiResult<AccountSnapshot> {
        let url = self.url("/api/mt5-account-info");
        debug!(url = %url, "Fetching account info");

        let resp = self.send(self.client.get(&url), "Account info fetch").await?;
        Self::read_json(resp, "Account info fetch").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{FakeBotServer, FakeBotState};
    use axum::http::StatusCode as AxumStatus;

    async fn unreachable_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    fn params() -> StrategyParams {
        StrategyParams {
            symbol: "EURUSD".into(),
            volume: 0.01,
            stop_loss: 50.0,
            take_profit: 100.0,
            timeframe: "M5".into(),
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&Value::Bool(true)));
        assert!(is_truthy(&serde_json::json!(1)));
        assert!(is_truthy(&serde_json::json!("yes")));
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&serde_json::json!(0)));
        assert!(!is_truthy(&serde_json::json!("")));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"success": false, "message": "Bot offline"}"#).as_deref(),
            Some("Bot offline")
        );
        assert_eq!(error_message(r#"{"error": "boom"}"#).as_deref(), Some("boom"));
        assert_eq!(error_message("<html>"), None);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BotConfigClient::new("http://10.0.0.5:5000/").unwrap();
        assert_eq!(client.base_url(), "http://10.0.0.5:5000");
    }

    #[tokio::test]
    async fn test_health_check_healthy() {
        let server = FakeBotServer::start(FakeBotState::default()).await;
        let client = BotConfigClient::new(server.url()).unwrap();
        assert!(client.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_health_check_http_500() {
        let mut state = FakeBotState::default();
        state.health_status = AxumStatus::INTERNAL_SERVER_ERROR;
        let server = FakeBotServer::start(state).await;
        let client = BotConfigClient::new(server.url()).unwrap();

        let err = client.health_check().await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
    }

    #[tokio::test]
    async fn test_health_check_degraded_status() {
        let mut state = FakeBotState::default();
        state.health_label = "degraded".into();
        let server = FakeBotServer::start(state).await;
        let client = BotConfigClient::new(server.url()).unwrap();

        assert!(matches!(
            client.health_check().await,
            Err(ApiError::Unhealthy(label)) if label == "degraded"
        ));
    }

    #[tokio::test]
    async fn test_every_operation_fails_cleanly_when_unreachable() {
        let client =
            BotConfigClient::with_timeout(unreachable_url().await, Duration::from_secs(2)).unwrap();

        assert!(matches!(client.health_check().await, Err(ApiError::Transport(_))));
        assert!(matches!(client.get_all_config().await, Err(ApiError::Transport(_))));
        assert!(matches!(
            client.update_setting("minbalance", "1").await,
            Err(ApiError::Transport(_))
        ));
        assert!(matches!(
            client.update_strategy("s", &StrategyStatus::Active).await,
            Err(ApiError::Transport(_))
        ));
        assert!(matches!(
            client.update_strategy_config("s", &params()).await,
            Err(ApiError::Transport(_))
        ));
        assert!(matches!(
            client.update_test_setting("test_mode", "ON").await,
            Err(ApiError::Transport(_))
        ));
        assert!(matches!(client.refresh_bot().await, Err(ApiError::Transport(_))));
        assert!(matches!(client.get_account_info().await, Err(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn test_every_operation_fails_cleanly_on_http_500() {
        let mut state = FakeBotState::default();
        state.config_status = AxumStatus::INTERNAL_SERVER_ERROR;
        state.update_status = AxumStatus::INTERNAL_SERVER_ERROR;
        state.account_status = AxumStatus::INTERNAL_SERVER_ERROR;
        let server = FakeBotServer::start(state).await;
        let client = BotConfigClient::new(server.url()).unwrap();

        let is_500 = |e: ApiError| e.status_code() == Some(500);
        assert!(is_500(client.get_all_config().await.unwrap_err()));
        assert!(is_500(client.update_setting("k", "v").await.unwrap_err()));
        assert!(is_500(
            client
                .update_strategy("s", &StrategyStatus::Test)
                .await
                .unwrap_err()
        ));
        assert!(is_500(
            client.update_strategy_config("s", &params()).await.unwrap_err()
        ));
        assert!(is_500(client.update_test_setting("k", "v").await.unwrap_err()));
        assert!(is_500(client.get_account_info().await.unwrap_err()));

        match client.refresh_bot().await {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "forced failure");
            }
            other => panic!("unexpected refresh result: {:?}", other),
        }
        assert_eq!(server.mutations(), 0);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failures_do_not_log_at_warn() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut state = FakeBotState::default();
        state.health_status = AxumStatus::INTERNAL_SERVER_ERROR;
        state.reject_updates = true;
        let server = FakeBotServer::start(state).await;
        let client = BotConfigClient::new(server.url()).unwrap();
        assert!(client.health_check().await.is_err());
        assert!(client.update_setting("k", "v").await.is_err());

        let offline =
            BotConfigClient::with_timeout(unreachable_url().await, Duration::from_secs(2)).unwrap();
        assert!(offline.get_all_config().await.is_err());

        assert!(logs.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_rejected_when_success_false() {
        let mut state = FakeBotState::default();
        state.reject_updates = true;
        let server = FakeBotServer::start(state).await;
        let client = BotConfigClient::new(server.url()).unwrap();

        assert!(matches!(
            client.update_setting("minbalance", "1").await,
            Err(ApiError::Rejected(_))
        ));
        assert!(matches!(client.refresh_bot().await, Err(ApiError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_setting_round_trip() {
        let mut state = FakeBotState::default();
        state.settings.insert("minbalance".into(), "100".into());
        let server = FakeBotServer::start(state).await;
        let client = BotConfigClient::new(server.url()).unwrap();

        assert_eq!(client.get_all_config().await.unwrap().settings["minbalance"], "100");
        client.update_setting("minbalance", "150").await.unwrap();
        assert_eq!(client.get_all_config().await.unwrap().settings["minbalance"], "150");
        assert_eq!(server.mutations(), 1);
    }

    #[tokio::test]
    async fn test_strategy_and_config_updates_reach_server() {
        let server = FakeBotServer::start(FakeBotState::default()).await;
        let client = BotConfigClient::new(server.url()).unwrap();

        client
            .update_strategy("breakout", &StrategyStatus::Inactive)
            .await
            .unwrap();
        client.update_strategy_config("breakout", &params()).await.unwrap();
        client.update_test_setting("refresh_bot", "ON").await.unwrap();

        let bundle = client.get_all_config().await.unwrap();
        assert_eq!(bundle.strategies["breakout"], StrategyStatus::Inactive);
        let cfg = &bundle.strategy_config["breakout"];
        assert_eq!(cfg.symbol.as_deref(), Some("EURUSD"));
        assert_eq!(cfg.volume, Some(0.01));
        assert_eq!(cfg.timeframe.as_deref(), Some("M5"));
        assert_eq!(bundle.test_settings["refresh_bot"], "ON");
    }

    #[tokio::test]
    async fn test_refresh_returns_server_message() {
        let server = FakeBotServer::start(FakeBotState::default()).await;
        let client = BotConfigClient::new(server.url()).unwrap();

        let message = client.refresh_bot().await.unwrap();
        assert_eq!(message, "Bot refreshed successfully");
        assert_eq!(server.state().refresh_count, 1);
    }

    #[tokio::test]
    async fn test_account_info_decodes_fixture() {
        let server = FakeBotServer::start(FakeBotState::default()).await;
        let client = BotConfigClient::new(server.url()).unwrap();

        let snapshot = client.get_account_info().await.unwrap();
        let account = snapshot.account.unwrap();
        assert_eq!(account.currency.as_deref(), Some("USD"));
        assert_eq!(snapshot.positions.unwrap().len(), 2);
        assert_eq!(snapshot.summary.unwrap().total_positions, 2);
    }
}
