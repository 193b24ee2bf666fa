//! Key/value buckets: general settings and test settings

use super::parse_index;
use crate::input::LineSource;
use crate::term::{rule, Console, PRESS_ENTER_BACK, PRESS_ENTER_CONTINUE};
use remote::analytics::{
    BALANCE_REFERENCE_KEY, DAILY_PROFIT_TARGET_KEY, DRAWDOWN_LIMIT_KEY, MIN_BALANCE_KEY,
};
use remote::{ApiResult, BotApi, ConfigBundle};
use std::collections::BTreeMap;
use std::io::{self, Write};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Settings,
    TestSettings,
}

impl Bucket {
    fn entries(self, bundle: &ConfigBundle) -> &BTreeMap<String, String> {
        match self {
            Bucket::Settings => &bundle.settings,
            Bucket::TestSettings => &bundle.test_settings,
        }
    }

    async fn update(self, api: &dyn BotApi, key: &str, value: &str) -> ApiResult<()> {
        match self {
            Bucket::Settings => api.update_setting(key, value).await,
            Bucket::TestSettings => api.update_test_setting(key, value).await,
        }
    }
}

/// Screen description for one key/value bucket
#[derive(Debug)]
pub struct KeyValueMenu {
    pub bucket: Bucket,
    pub title: &'static str,
    /// Lowercase noun: "setting", "test setting"
    pub noun: &'static str,
    /// Keys offered by number before the custom-key entry
    pub common_keys: &'static [&'static str],
}

pub const SETTINGS: KeyValueMenu = KeyValueMenu {
    bucket: Bucket::Settings,
    title: "⚙️ SETTINGS",
    noun: "setting",
    common_keys: &[
        BALANCE_REFERENCE_KEY,
        MIN_BALANCE_KEY,
        DRAWDOWN_LIMIT_KEY,
        DAILY_PROFIT_TARGET_KEY,
        "max_positions",
        "risk_per_trade",
        "enable_trading",
        "debug_mode",
    ],
};

pub const TEST_SETTINGS: KeyValueMenu = KeyValueMenu {
    bucket: Bucket::TestSettings,
    title: "🧪 TEST SETTINGS",
    noun: "test setting",
    common_keys: &[
        "refresh_bot",
        "test_mode",
        "debug_level",
        "log_level",
        "enable_notifications",
        "auto_restart",
        "performance_mode",
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Update,
    Refresh,
    Back,
}

impl Action {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "1" | "update" => Some(Self::Update),
            "2" | "refresh" => Some(Self::Refresh),
            "0" | "back" => Some(Self::Back),
            _ => None,
        }
    }
}

pub async fn run<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
    menu: &KeyValueMenu,
) -> io::Result<()> {
    loop {
        console.clear_screen()?;
        console.header(api.base_url())?;
        writeln!(console, "{}", menu.title)?;
        writeln!(console, "{}", rule('=', 60))?;

        let bundle = match api.get_all_config().await {
            Ok(bundle) => bundle,
            Err(e) => {
                writeln!(console, "❌ Could not load configuration from server: {}", e)?;
                console.pause(PRESS_ENTER_BACK).await?;
                return Ok(());
            }
        };
        let entries = menu.bucket.entries(&bundle);

        writeln!(console, "📋 CURRENT {}S:", menu.noun.to_uppercase())?;
        writeln!(console, "{}", rule('-', 60))?;
        if entries.is_empty() {
            writeln!(console, "  No {}s", menu.noun)?;
        }
        for (key, value) in entries {
            writeln!(console, "  {}: {}", key, value)?;
        }

        writeln!(console, "\n🔧 OPTIONS:")?;
        writeln!(console, "  1. 📝 Update {}", menu.noun)?;
        writeln!(console, "  2. 🔄 Refresh list")?;
        writeln!(console, "  0. 🔙 Back to main menu")?;
        writeln!(console, "{}", rule('-', 60))?;

        let choice = console.choice("Select option (0-2): ").await?;
        match Action::parse(&choice) {
            Some(Action::Back) => return Ok(()),
            Some(Action::Update) => {
                update_entry(console, api, menu, entries).await?;
                console.pause(PRESS_ENTER_CONTINUE).await?;
            }
            Some(Action::Refresh) => writeln!(console, "🔄 Refreshing...")?,
            None => {
                writeln!(console, "❌ Invalid choice!")?;
                console.pause(PRESS_ENTER_CONTINUE).await?;
            }
        }
    }
}

async fn update_entry<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
    menu: &KeyValueMenu,
    current: &BTreeMap<String, String>,
) -> io::Result<()> {
    writeln!(console, "\n📝 UPDATE {}", menu.noun.to_uppercase())?;
    writeln!(console, "{}", rule('-', 40))?;
    writeln!(console, "Available {}s:", menu.noun)?;

    let keys = menu.common_keys;
    for (i, key) in keys.iter().enumerate() {
        let value = current.get(*key).map(String::as_str).unwrap_or("not set");
        writeln!(console, "  {}. {}: {}", i + 1, key, value)?;
    }
    let custom = keys.len() + 1;
    writeln!(console, "  {}. Custom key", custom)?;

    let label = format!("\nSelect {} (1-{}): ", menu.noun, custom);
    let Some(raw) = console.read_line(&label).await? else {
        return Ok(());
    };
    let Ok(selected) = raw.parse::<usize>() else {
        writeln!(console, "❌ Please enter a number!")?;
        return Ok(());
    };

    let key = if let Some(index) = parse_index(&raw, keys.len()) {
        keys[index].to_string()
    } else if selected == custom {
        let prompt = format!("Enter {} name: ", menu.noun);
        match console.read_line(&prompt).await? {
            Some(name) => name,
            None => return Ok(()),
        }
    } else {
        writeln!(console, "❌ Invalid choice!")?;
        return Ok(());
    };

    if key.is_empty() {
        writeln!(console, "❌ The {} name cannot be empty!", menu.noun)?;
        return Ok(());
    }

    let Some(value) = console.read_line(&format!("Enter value for {}: ", key)).await? else {
        return Ok(());
    };

    match menu.bucket.update(api, &key, &value).await {
        Ok(()) => {
            info!(key = %key, value = %value, bucket = ?menu.bucket, "Updated");
            writeln!(console, "✅ Updated {} {}", menu.noun, key)?;
        }
        Err(e) => writeln!(console, "❌ Failed to update {} {}: {}", menu.noun, key, e)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{console, harness, output};
    use remote::testkit::{FakeBotState, StatusCode};

    #[tokio::test]
    async fn test_setting_round_trip() {
        let h = harness(FakeBotState::default().with_setting("minbalance", "100")).await;
        // update -> minbalance (2nd common key) -> 150 -> Enter -> back
        let mut console = console(&["1", "2", "150", "", "0"]);

        run(&mut console, &h.client, &SETTINGS).await.unwrap();

        assert_eq!(h.server.mutations(), 1);
        let bundle = h.client.get_all_config().await.unwrap();
        assert_eq!(bundle.settings.get("minbalance").map(String::as_str), Some("150"));

        let text = output(&console);
        assert!(text.contains("  minbalance: 100"));
        assert!(text.contains("  minbalance: 150"));
        assert!(text.contains("✅ Updated setting minbalance"));
    }

    #[tokio::test]
    async fn test_custom_test_setting() {
        let h = harness(FakeBotState::default()).await;
        let mut console = console(&["update", "8", "night_mode", "ON", "", "back"]);

        run(&mut console, &h.client, &TEST_SETTINGS).await.unwrap();

        let state = h.server.state();
        assert_eq!(state.test_settings.get("night_mode").map(String::as_str), Some("ON"));
        assert!(state.settings.is_empty());
    }

    #[tokio::test]
    async fn test_bad_selection_sends_nothing() {
        let h = harness(FakeBotState::default()).await;
        let mut console = console(&["1", "abc", "", "1", "42", "", "1", "9", "", ""]);

        run(&mut console, &h.client, &SETTINGS).await.unwrap();

        assert_eq!(h.server.mutations(), 0);
        let text = output(&console);
        assert!(text.contains("❌ Please enter a number!"));
        assert!(text.contains("❌ Invalid choice!"));
        assert!(text.contains("❌ The setting name cannot be empty!"));
    }

    #[tokio::test]
    async fn test_rejected_update_is_reported() {
        let mut state = FakeBotState::default();
        state.reject_updates = true;
        let h = harness(state).await;
        let mut console = console(&["1", "1", "10000", "", "0"]);

        run(&mut console, &h.client, &SETTINGS).await.unwrap();

        assert!(output(&console).contains("❌ Failed to update setting balanceat5am"));
        assert!(h.server.state().settings.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_returns_to_parent() {
        let mut state = FakeBotState::default();
        state.config_status = StatusCode::INTERNAL_SERVER_ERROR;
        let h = harness(state).await;
        let mut console = console(&[""]);

        run(&mut console, &h.client, &SETTINGS).await.unwrap();

        let text = output(&console);
        assert!(text.contains("❌ Could not load configuration from server"));
        assert!(!text.contains("OPTIONS"));
    }
}
