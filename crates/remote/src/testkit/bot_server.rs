//! Fake trading-bot config server

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

type Shared = Arc<Mutex<FakeBotState>>;
type Reply = (StatusCode, Json<Value>);

/// Mutable server state. Tests tweak the status fields to force failures.
#[derive(Debug, Clone)]
pub struct FakeBotState {
    pub settings: BTreeMap<String, String>,
    pub strategies: BTreeMap<String, String>,
    pub strategy_config: BTreeMap<String, Value>,
    pub test_settings: BTreeMap<String, String>,
    pub account: Value,

    pub health_status: StatusCode,
    pub health_label: String,
    pub config_status: StatusCode,
    pub update_status: StatusCode,
    pub account_status: StatusCode,
    /// Answer 200 with `success: false` to every mutation
    pub reject_updates: bool,

    /// Successful mutating requests seen so far
    pub mutations: usize,
    pub refresh_count: usize,
}

impl Default for FakeBotState {
    fn default() -> Self {
        Self {
            settings: BTreeMap::new(),
            strategies: BTreeMap::new(),
            strategy_config: BTreeMap::new(),
            test_settings: BTreeMap::new(),
            account: sample_account(),
            health_status: StatusCode::OK,
            health_label: "healthy".into(),
            config_status: StatusCode::OK,
            update_status: StatusCode::OK,
            account_status: StatusCode::OK,
            reject_updates: false,
            mutations: 0,
            refresh_count: 0,
        }
    }
}

impl FakeBotState {
    pub fn with_setting(mut self, key: &str, value: &str) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn with_strategy(mut self, name: &str, status: &str) -> Self {
        self.strategies.insert(name.into(), status.into());
        self
    }

    pub fn with_strategy_config(mut self, name: &str, config: Value) -> Self {
        self.strategy_config.insert(name.into(), config);
        self
    }

    pub fn with_test_setting(mut self, key: &str, value: &str) -> Self {
        self.test_settings.insert(key.into(), value.into());
        self
    }

    fn forced_update_failure(&self) -> Option<Reply> {
        if self.update_status != StatusCode::OK {
            return Some((
                self.update_status,
                Json(json!({"success": false, "message": "forced failure"})),
            ));
        }
        if self.reject_updates {
            return Some((
                StatusCode::OK,
                Json(json!({"success": false, "message": "rejected by fake server"})),
            ));
        }
        None
    }

    fn ack(&mut self) -> Reply {
        self.mutations += 1;
        (StatusCode::OK, Json(json!({"success": true, "message": "updated"})))
    }
}

/// Account payload shaped like the bot's `/api/mt5-account-info`
pub fn sample_account() -> Value {
    json!({
        "success": true,
        "account": {
            "login": 5012345,
            "server": "Demo-Server",
            "balance": 10250.5,
            "equity": 10238.0,
            "profit": -12.5,
            "margin": 120.0,
            "free_margin": 10118.0,
            "margin_level": 8531.67,
            "currency": "USD"
        },
        "positions": [
            {"ticket": 101, "symbol": "EURUSD", "type": 0, "volume": 0.1,
             "price_open": 1.08512, "profit": 8.0, "comment": "scalper"},
            {"ticket": 102, "symbol": "XAUUSD", "type": 1, "volume": 0.05,
             "price_open": 2301.12, "profit": -20.5, "comment": "breakout"}
        ],
        "summary": {
            "total_positions": 2,
            "total_profit": -12.5,
            "profitable_positions": 1,
            "losing_positions": 1
        },
        "timestamp": "2024-01-03T10:00:00"
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct KeyValueBody {
    key: String,
    value: String,
}

#[derive(Deserialize)]
struct StrategyBody {
    strategy_name: String,
    strategy_type: String,
}

#[derive(Deserialize)]
struct StrategyConfigBody {
    strategy_name: String,
    symbol: String,
    volume: f64,
    stop_loss: f64,
    take_profit: f64,
    timeframe: String,
}

async fn health(State(state): State<Shared>) -> Reply {
    let st = state.lock().unwrap();
    (st.health_status, Json(json!({"status": st.health_label})))
}

async fn config(State(state): State<Shared>) -> Reply {
    let st = state.lock().unwrap();
    if st.config_status != StatusCode::OK {
        return (
            st.config_status,
            Json(json!({"success": false, "message": "forced failure"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "config": {
                "settings": st.settings,
                "strategies": st.strategies,
                "strategy_config": st.strategy_config,
                "test_settings": st.test_settings,
            }
        })),
    )
}

async fn put_setting(State(state): State<Shared>, Json(body): Json<KeyValueBody>) -> Reply {
    let mut st = state.lock().unwrap();
    if let Some(reply) = st.forced_update_failure() {
        return reply;
    }
    st.settings.insert(body.key, body.value);
    st.ack()
}

async fn put_strategy(State(state): State<Shared>, Json(body): Json<StrategyBody>) -> Reply {
    let mut st = state.lock().unwrap();
    if let Some(reply) = st.forced_update_failure() {
        return reply;
    }
    st.strategies.insert(body.strategy_name, body.strategy_type);
    st.ack()
}

async fn put_strategy_config(
    State(state): State<Shared>,
    Json(body): Json<StrategyConfigBody>,
) -> Reply {
    let mut st = state.lock().unwrap();
    if let Some(reply) = st.forced_update_failure() {
        return reply;
    }
    st.strategy_config.insert(
        body.strategy_name,
        json!({
            "symbol": body.symbol,
            "volume": body.volume,
            "stop_loss": body.stop_loss,
            "take_profit": body.take_profit,
            "timeframe": body.timeframe,
        }),
    );
    st.ack()
}

async fn put_test_setting(State(state): State<Shared>, Json(body): Json<KeyValueBody>) -> Reply {
    let mut st = state.lock().unwrap();
    if let Some(reply) = st.forced_update_failure() {
        return reply;
    }
    st.test_settings.insert(body.key, body.value);
    st.ack()
}

async fn refresh_bot(State(state): State<Shared>) -> Reply {
    let mut st = state.lock().unwrap();
    if let Some(reply) = st.forced_update_failure() {
        return reply;
    }
    st.refresh_count += 1;
    (
        StatusCode::OK,
        Json(json!({"success": true, "message": "Bot refreshed successfully"})),
    )
}

async fn account_info(State(state): State<Shared>) -> Reply {
    let st = state.lock().unwrap();
    if st.account_status != StatusCode::OK {
        return (
            st.account_status,
            Json(json!({"success": false, "message": "MT5 not connected"})),
        );
    }
    (StatusCode::OK, Json(st.account.clone()))
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Running fake server; aborted on drop
pub struct FakeBotServer {
    base_url: String,
    state: Shared,
    handle: JoinHandle<()>,
}

impl FakeBotServer {
    pub async fn start(initial: FakeBotState) -> Self {
        let state: Shared = Arc::new(Mutex::new(initial));

        let app = Router::new()
            .route("/api/health", get(health))
            .route("/api/config", get(config))
            .route("/api/config/settings", put(put_setting))
            .route("/api/config/strategies", put(put_strategy))
            .route("/api/config/strategy-config", put(put_strategy_config))
            .route("/api/config/test-settings", put(put_test_setting))
            .route("/api/refresh-bot", post(refresh_bot))
            .route("/api/mt5-account-info", get(account_info))
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

    pub fn state(&self) -> MutexGuard<'_, FakeBotState> {
        self.state.lock().unwrap()
    }

    pub fn mutations(&self) -> usize {
        self.state().mutations
    }
}

impl Drop for FakeBotServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
