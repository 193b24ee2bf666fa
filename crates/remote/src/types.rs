//! Typed records decoded from the bot config API and the video API
//!
//! The bot server is loosely typed: values may arrive as strings or
//! numbers, and any field may be missing. Everything is normalized here,
//! once, so display code never touches raw JSON.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Configuration bundle
// ---------------------------------------------------------------------------

/// The four configuration buckets returned by `GET /api/config`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigBundle {
    #[serde(deserialize_with = "de::string_map")]
    pub settings: BTreeMap<String, String>,
    #[serde(deserialize_with = "de::status_map")]
    pub strategies: BTreeMap<String, StrategyStatus>,
    #[serde(deserialize_with = "de::strategy_config_map")]
    pub strategy_config: BTreeMap<String, StrategyConfig>,
    #[serde(deserialize_with = "de::string_map")]
    pub test_settings: BTreeMap<String, String>,
}

impl ConfigBundle {
    /// Names of strategies whose status is `active`
    pub fn active_strategies(&self) -> Vec<&str> {
        self.strategies
            .iter()
            .filter(|(_, status)| **status == StrategyStatus::Active)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Strategy status label. Unknown labels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StrategyStatus {
    Active,
    Inactive,
    Test,
    /// Sentinel sent instead of a real removal
    Deleted,
    Other(String),
}

impl StrategyStatus {
    /// Statuses an operator can pick when adding or editing a strategy
    pub const SELECTABLE: [StrategyStatus; 3] =
        [StrategyStatus::Active, StrategyStatus::Inactive, StrategyStatus::Test];

    pub fn as_str(&self) -> &str {
        match self {
            StrategyStatus::Active => "active",
            StrategyStatus::Inactive => "inactive",
            StrategyStatus::Test => "test",
            StrategyStatus::Deleted => "deleted",
            StrategyStatus::Other(label) => label,
        }
    }
}

impl From<String> for StrategyStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "active" => StrategyStatus::Active,
            "inactive" => StrategyStatus::Inactive,
            "test" => StrategyStatus::Test,
            "deleted" => StrategyStatus::Deleted,
            _ => StrategyStatus::Other(label),
        }
    }
}

impl From<StrategyStatus> for String {
    fn from(status: StrategyStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for StrategyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-strategy trading parameters as stored on the server.
/// `None` means the server did not send the field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    #[serde(deserialize_with = "de::opt_string")]
    pub symbol: Option<String>,
    #[serde(deserialize_with = "de::opt_f64")]
    pub volume: Option<f64>,
    #[serde(deserialize_with = "de::opt_f64")]
    pub stop_loss: Option<f64>,
    #[serde(deserialize_with = "de::opt_f64")]
    pub take_profit: Option<f64>,
    #[serde(deserialize_with = "de::opt_string")]
    pub timeframe: Option<String>,
}

/// Complete parameter set sent with `PUT /api/config/strategy-config`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyParams {
    pub symbol: String,
    pub volume: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub timeframe: String,
}

impl StrategyParams {
    /// Emptied record used to clear a strategy's config
    pub fn cleared() -> Self {
        Self {
            symbol: String::new(),
            volume: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            timeframe: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Account snapshot
// ---------------------------------------------------------------------------

/// Response of `GET /api/mt5-account-info`. Sections are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountSnapshot {
    pub account: Option<AccountInfo>,
    pub positions: Option<Vec<Position>>,
    pub summary: Option<AccountSummary>,
    #[serde(deserialize_with = "de::opt_string")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountInfo {
    #[serde(deserialize_with = "de::opt_string")]
    pub login: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    pub server: Option<String>,
    #[serde(deserialize_with = "de::decimal")]
    pub balance: Decimal,
    #[serde(deserialize_with = "de::decimal")]
    pub equity: Decimal,
    #[serde(deserialize_with = "de::decimal")]
    pub profit: Decimal,
    #[serde(deserialize_with = "de::decimal")]
    pub margin: Decimal,
    #[serde(deserialize_with = "de::decimal")]
    pub free_margin: Decimal,
    #[serde(deserialize_with = "de::decimal")]
    pub margin_level: Decimal,
    #[serde(deserialize_with = "de::opt_string")]
    pub currency: Option<String>,
}

/// Direction of an open position (`type` 0 is buy, anything else sell)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PositionSide {
    #[default]
    Buy,
    Sell,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Buy => "BUY",
            PositionSide::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Position {
    #[serde(deserialize_with = "de::opt_string")]
    pub ticket: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    pub symbol: Option<String>,
    #[serde(rename = "type", deserialize_with = "de::side")]
    pub side: PositionSide,
    #[serde(deserialize_with = "de::decimal")]
    pub volume: Decimal,
    #[serde(deserialize_with = "de::decimal")]
    pub price_open: Decimal,
    #[serde(deserialize_with = "de::decimal")]
    pub profit: Decimal,
    #[serde(deserialize_with = "de::opt_string")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountSummary {
    #[serde(deserialize_with = "de::count")]
    pub total_positions: u64,
    #[serde(deserialize_with = "de::decimal")]
    pub total_profit: Decimal,
    #[serde(deserialize_with = "de::count")]
    pub profitable_positions: u64,
    #[serde(deserialize_with = "de::count")]
    pub losing_positions: u64,
}

// ---------------------------------------------------------------------------
// Video feed
// ---------------------------------------------------------------------------

/// One upload found by the video poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub published_at: DateTime<Utc>,
    pub title: String,
    pub url: String,
    /// Handle of the source the video was found through
    pub source: String,
}

// ---------------------------------------------------------------------------
// Lenient deserializers
// ---------------------------------------------------------------------------

mod de {
    use super::{PositionSide, StrategyConfig, StrategyStatus};
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::collections::BTreeMap;
    use std::str::FromStr;

    fn render(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    fn parse_decimal(raw: &str) -> Option<Decimal> {
        let raw = raw.trim();
        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .ok()
    }

    pub fn string_map<'de, D>(d: D) -> Result<BTreeMap<String, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<BTreeMap<String, Value>> = Option::deserialize(d)?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, render(v).unwrap_or_default()))
            .collect())
    }

    pub fn status_map<'de, D>(d: D) -> Result<BTreeMap<String, StrategyStatus>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(string_map(d)?
            .into_iter()
            .map(|(k, v)| (k, StrategyStatus::from(v)))
            .collect())
    }

    pub fn strategy_config_map<'de, D>(d: D) -> Result<BTreeMap<String, StrategyConfig>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<BTreeMap<String, Option<StrategyConfig>>> = Option::deserialize(d)?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.unwrap_or_default()))
            .collect())
    }

    pub fn opt_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(render(Value::deserialize(d)?))
    }

    pub fn opt_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn decimal<'de, D>(d: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => parse_decimal(&n.to_string()).unwrap_or_default(),
            Value::String(s) => parse_decimal(&s).unwrap_or_default(),
            _ => Decimal::ZERO,
        })
    }

    pub fn count<'de, D>(d: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(0),
            Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        })
    }

    pub fn side<'de, D>(d: D) -> Result<PositionSide, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) if n.as_f64() == Some(0.0) => PositionSide::Buy,
            Value::Number(_) => PositionSide::Sell,
            Value::String(s) if s.eq_ignore_ascii_case("sell") => PositionSide::Sell,
            _ => PositionSide::Buy,
        })
    }
}
