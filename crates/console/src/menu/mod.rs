//! Menu controller
//!
//! Every screen re-fetches the configuration on entry and issues at most
//! one update call per operator action. Input that fails validation is
//! reported and the same screen is shown again without touching the
//! server.

pub mod overview;
pub mod refresh;
pub mod settings;
pub mod strategies;
pub mod strategy_config;

use crate::dashboard;
use crate::input::LineSource;
use crate::term::{rule, Console, APP_VERSION, PRESS_ENTER_CONTINUE};
use remote::{ApiError, ApiResult, BotApi};
use std::io::{self, Write};
use tracing::{debug, info};

pub const DEFAULT_PORT: u16 = 5000;

/// Turn operator input into a base URL: a bare host gets `http://` and
/// the default port, `host:port` gets `http://`, a full URL is kept.
/// IPv6 literals are accepted bare (`::1`) or bracketed (`[::1]:8080`).
pub fn normalize_server_address(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input.contains("://") {
        return Some(input.to_string());
    }
    if input.starts_with('[') {
        if input.ends_with(']') {
            return Some(format!("http://{}:{}", input, DEFAULT_PORT));
        }
        return Some(format!("http://{}", input));
    }
    match input.matches(':').count() {
        0 => Some(format!("http://{}:{}", input, DEFAULT_PORT)),
        1 => Some(format!("http://{}", input)),
        _ => Some(format!("http://[{}]:{}", input, DEFAULT_PORT)),
    }
}

/// 1-based selection into a zero-based index
pub fn parse_index(input: &str, len: usize) -> Option<usize> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        _ => None,
    }
}

/// List `names` numbered from 1 and read a selection. Prints the problem
/// and returns `None` for non-numbers, out-of-range picks or end of input.
pub(crate) async fn pick_entry<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    names: &[&str],
    noun: &str,
) -> io::Result<Option<usize>> {
    for (i, name) in names.iter().enumerate() {
        writeln!(console, "  {}. {}", i + 1, name)?;
    }
    let label = format!("\nSelect {} (1-{}): ", noun, names.len());
    let Some(raw) = console.read_line(&label).await? else {
        return Ok(None);
    };
    if raw.parse::<usize>().is_err() {
        writeln!(console, "❌ Please enter a number!")?;
        return Ok(None);
    }
    let index = parse_index(&raw, names.len());
    if index.is_none() {
        writeln!(console, "❌ Invalid choice!")?;
    }
    Ok(index)
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

/// Probe the server once. On failure print troubleshooting and offer to
/// switch to another address; `build` makes the client for a new address.
pub async fn connect<I, W, A, F>(console: &mut Console<I, W>, api: A, build: F) -> io::Result<A>
where
    I: LineSource,
    W: Write,
    A: BotApi,
    F: Fn(&str) -> ApiResult<A>,
{
    writeln!(console, "🚀 BOT CONFIG CLIENT v{}", APP_VERSION)?;
    writeln!(console, "{}", rule('=', 60))?;
    writeln!(console, "📡 Checking connection...")?;

    let probe = api.health_check().await;
    let err = match probe {
        Ok(()) => {
            info!(server = api.base_url(), "Connected");
            writeln!(console, "✅ Connected to {}", api.base_url())?;
            return Ok(api);
        }
        Err(e) => e,
    };

    writeln!(console, "❌ Cannot connect to {}: {}", api.base_url(), err)?;
    writeln!(console, "\n🔧 TROUBLESHOOTING:")?;
    writeln!(console, "1. Make sure the bot config server is running")?;
    writeln!(console, "2. Check the server address (--server or BOT_SERVER_URL)")?;
    writeln!(console, "3. Make sure port {} is open", DEFAULT_PORT)?;
    writeln!(console, "4. Check the firewall")?;
    writeln!(console, "\nCurrent address: {}", api.base_url())?;

    if !console.confirm("Do you want to change the server address?").await? {
        return Ok(api);
    }
    let Some(raw) = console
        .read_line("Enter new address (host, host:port or URL): ")
        .await?
    else {
        return Ok(api);
    };
    let Some(address) = normalize_server_address(&raw) else {
        return Ok(api);
    };

    match build(&address) {
        Ok(new_api) => {
            info!(server = new_api.base_url(), "Server address changed");
            writeln!(console, "✅ Server address changed to {}", new_api.base_url())?;
            console.pause(PRESS_ENTER_CONTINUE).await?;
            Ok(new_api)
        }
        Err(e) => {
            writeln!(console, "❌ Cannot use address {}: {}", address, e)?;
            Ok(api)
        }
    }
}

// ---------------------------------------------------------------------------
// Main menu
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MainAction {
    Settings,
    Strategies,
    StrategyConfig,
    TestSettings,
    RefreshBot,
    FullConfig,
    Account,
    Quit,
}

impl MainAction {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "1" | "settings" => Some(Self::Settings),
            "2" | "strategies" => Some(Self::Strategies),
            "3" | "config" => Some(Self::StrategyConfig),
            "4" | "test" => Some(Self::TestSettings),
            "5" | "refresh" => Some(Self::RefreshBot),
            "6" | "view" => Some(Self::FullConfig),
            "7" | "account" => Some(Self::Account),
            "0" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

fn write_connection_help(
    out: &mut impl Write,
    server_url: &str,
    err: &ApiError,
) -> io::Result<()> {
    writeln!(out, "❌ Cannot connect to server!")?;
    writeln!(out, "Please check:")?;
    writeln!(out, "  - Is the server running?")?;
    writeln!(out, "  - Is the address correct?")?;
    writeln!(out, "  - Is port {} open?", DEFAULT_PORT)?;
    writeln!(out, "  - Current URL: {}", server_url)?;
    writeln!(out, "  - Error: {}", err)
}

/// Main loop. Returns when the operator quits or input ends.
pub async fn run_main_menu<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
) -> io::Result<()> {
    loop {
        console.clear_screen()?;
        console.header(api.base_url())?;

        if let Err(e) = api.health_check().await {
            debug!(error = %e, "Health probe failed");
            write_connection_help(console, api.base_url(), &e)?;
            writeln!(console, "\nPress Enter to retry...")?;
            if !console.pause("").await? {
                return Ok(());
            }
            continue;
        }

        writeln!(console, "✅ Connected to server")?;

        match api.get_all_config().await {
            Ok(bundle) => {
                writeln!(console, "📊 Statistics:")?;
                writeln!(console, "  - Settings: {} items", bundle.settings.len())?;
                writeln!(console, "  - Strategies: {} items", bundle.strategies.len())?;
                writeln!(console, "  - Strategy Configs: {} items", bundle.strategy_config.len())?;
                writeln!(console, "  - Test Settings: {} items", bundle.test_settings.len())?;
                let refresh_flag = bundle
                    .test_settings
                    .get("refresh_bot")
                    .map(String::as_str)
                    .unwrap_or("N/A");
                writeln!(console, "  - Refresh Bot: {}", refresh_flag)?;
            }
            Err(e) => debug!(error = %e, "Config fetch for statistics failed"),
        }

        writeln!(console, "\n🔧 MAIN MENU:")?;
        writeln!(console, "  1. ⚙️  Settings")?;
        writeln!(console, "  2. 🎯 Strategies")?;
        writeln!(console, "  3. ⚙️  Strategy Config")?;
        writeln!(console, "  4. 🧪 Test Settings")?;
        writeln!(console, "  5. 🔄 Refresh Bot")?;
        writeln!(console, "  6. 📊 View Full Configuration")?;
        writeln!(console, "  7. 💰 MT5 Account Info")?;
        writeln!(console, "  0. 🚪 Quit")?;
        writeln!(console, "{}", rule('-', 60))?;

        let choice = console.choice("Select function (0-7): ").await?;
        match MainAction::parse(&choice) {
            Some(MainAction::Quit) => {
                writeln!(console, "👋 Goodbye!")?;
                return Ok(());
            }
            Some(MainAction::Settings) => settings::run(console, api, &settings::SETTINGS).await?,
            Some(MainAction::Strategies) => strategies::run(console, api).await?,
            Some(MainAction::StrategyConfig) => strategy_config::run(console, api).await?,
            Some(MainAction::TestSettings) => {
                settings::run(console, api, &settings::TEST_SETTINGS).await?
            }
            Some(MainAction::RefreshBot) => refresh::run(console, api).await?,
            Some(MainAction::FullConfig) => overview::run(console, api).await?,
            Some(MainAction::Account) => dashboard::run(console, api).await?,
            None => {
                writeln!(console, "❌ Invalid choice!")?;
                console.pause(PRESS_ENTER_CONTINUE).await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{console, harness, output};
    use remote::testkit::{FakeBotServer, FakeBotState, StatusCode};
    use remote::BotConfigClient;
    use serde_json::json;

    fn fixture() -> FakeBotState {
        FakeBotState::default()
            .with_setting("minbalance", "100")
            .with_setting("drawdown", "500")
            .with_strategy("breakout", "active")
            .with_strategy("scalper", "inactive")
            .with_strategy("grid", "test")
            .with_strategy_config("breakout", json!({"symbol": "XAUUSD", "volume": 0.05}))
            .with_test_setting("refresh_bot", "OFF")
            .with_test_setting("test_mode", "ON")
    }

    #[test]
    fn test_normalize_server_address() {
        assert_eq!(
            normalize_server_address("192.168.1.20").as_deref(),
            Some("http://192.168.1.20:5000")
        );
        assert_eq!(
            normalize_server_address(" bot.local:8080 ").as_deref(),
            Some("http://bot.local:8080")
        );
        assert_eq!(
            normalize_server_address("https://abc.ngrok-free.app").as_deref(),
            Some("https://abc.ngrok-free.app")
        );
        assert_eq!(normalize_server_address("   "), None);
    }

    #[test]
    fn test_normalize_ipv6_address() {
        assert_eq!(
            normalize_server_address("::1").as_deref(),
            Some("http://[::1]:5000")
        );
        assert_eq!(
            normalize_server_address("[::1]").as_deref(),
            Some("http://[::1]:5000")
        );
        assert_eq!(
            normalize_server_address("[fe80::2]:8080").as_deref(),
            Some("http://[fe80::2]:8080")
        );
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("1", 3), Some(0));
        assert_eq!(parse_index(" 3 ", 3), Some(2));
        assert_eq!(parse_index("0", 3), None);
        assert_eq!(parse_index("4", 3), None);
        assert_eq!(parse_index("x", 3), None);
        assert_eq!(parse_index("1", 0), None);
    }

    #[test]
    fn test_main_action_aliases() {
        assert_eq!(MainAction::parse("7"), Some(MainAction::Account));
        assert_eq!(MainAction::parse("QUIT"), Some(MainAction::Quit));
        assert_eq!(MainAction::parse("8"), None);
    }

    #[tokio::test]
    async fn test_healthy_probe_shows_statistics() {
        let h = harness(fixture()).await;
        let mut console = console(&["0"]);

        run_main_menu(&mut console, &h.client).await.unwrap();

        let text = output(&console);
        assert!(text.contains("✅ Connected to server"));
        assert!(text.contains("  - Settings: 2 items"));
        assert!(text.contains("  - Strategies: 3 items"));
        assert!(text.contains("  - Strategy Configs: 1 items"));
        assert!(text.contains("  - Test Settings: 2 items"));
        assert!(text.contains("  - Refresh Bot: OFF"));
        assert!(text.contains("👋 Goodbye!"));
        assert_eq!(h.server.mutations(), 0);
    }

    #[tokio::test]
    async fn test_failed_probe_reprompts_without_config() {
        let mut state = fixture();
        state.health_status = StatusCode::INTERNAL_SERVER_ERROR;
        let h = harness(state).await;
        // One retry, then input ends
        let mut console = console(&[""]);

        run_main_menu(&mut console, &h.client).await.unwrap();

        let text = output(&console);
        assert_eq!(text.matches("❌ Cannot connect to server!").count(), 2);
        assert_eq!(text.matches("Press Enter to retry...").count(), 2);
        assert!(!text.contains("Statistics"));
        assert!(!text.contains("MAIN MENU"));
    }

    #[tokio::test]
    async fn test_unhealthy_label_counts_as_failure() {
        let mut state = fixture();
        state.health_label = "degraded".into();
        let h = harness(state).await;
        let mut console = console(&[]);

        run_main_menu(&mut console, &h.client).await.unwrap();

        assert!(output(&console).contains("❌ Cannot connect to server!"));
    }

    #[tokio::test]
    async fn test_invalid_main_choice() {
        let h = harness(fixture()).await;
        let mut console = console(&["9", ""]);

        run_main_menu(&mut console, &h.client).await.unwrap();

        let text = output(&console);
        assert!(text.contains("❌ Invalid choice!"));
        assert_eq!(text.matches("MAIN MENU").count(), 2);
    }

    #[tokio::test]
    async fn test_connect_switches_address() {
        let mut down = fixture();
        down.health_status = StatusCode::SERVICE_UNAVAILABLE;
        let dead = FakeBotServer::start(down).await;
        let live = FakeBotServer::start(fixture()).await;

        let host_port = live.url().trim_start_matches("http://").to_string();
        let mut console = console(&["y", host_port.as_str(), ""]);
        let client = BotConfigClient::new(dead.url()).unwrap();

        let client = connect(&mut console, client, |addr| BotConfigClient::new(addr))
            .await
            .unwrap();

        assert_eq!(client.base_url(), live.url());
        assert!(client.health_check().await.is_ok());
        let text = output(&console);
        assert!(text.contains("TROUBLESHOOTING"));
        assert!(text.contains("Server address changed"));
    }

    #[tokio::test]
    async fn test_connect_keeps_address_when_declined() {
        let mut down = fixture();
        down.health_status = StatusCode::INTERNAL_SERVER_ERROR;
        let h = harness(down).await;
        let mut console = console(&["n"]);
        let original = h.client.base_url().to_string();

        let client = connect(&mut console, h.client.clone(), |addr| BotConfigClient::new(addr))
            .await
            .unwrap();

        assert_eq!(client.base_url(), original);
    }
}
