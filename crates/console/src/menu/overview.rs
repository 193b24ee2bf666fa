//! Read-only view of every configuration bucket

use super::strategies::write_strategy_line;
use super::strategy_config::write_config_block;
use crate::input::LineSource;
use crate::term::{rule, Console, PRESS_ENTER_BACK, PRESS_ENTER_MAIN};
use remote::{BotApi, ConfigBundle};
use std::collections::BTreeMap;
use std::io::{self, Write};

fn write_pairs(out: &mut impl Write, pairs: &BTreeMap<String, String>, empty: &str) -> io::Result<()> {
    if pairs.is_empty() {
        writeln!(out, "  {}", empty)?;
    }
    for (key, value) in pairs {
        writeln!(out, "  {}: {}", key, value)?;
    }
    Ok(())
}

pub fn write_bundle(out: &mut impl Write, bundle: &ConfigBundle) -> io::Result<()> {
    writeln!(out, "📋 CONFIGURATION DETAILS:")?;
    writeln!(out, "{}", rule('=', 60))?;

    writeln!(out, "\n⚙️ SETTINGS:")?;
    writeln!(out, "{}", rule('-', 40))?;
    write_pairs(out, &bundle.settings, "No settings")?;

    writeln!(out, "\n🎯 STRATEGIES:")?;
    writeln!(out, "{}", rule('-', 40))?;
    if bundle.strategies.is_empty() {
        writeln!(out, "  No strategies")?;
    }
    for (name, status) in &bundle.strategies {
        write_strategy_line(out, name, status)?;
    }

    writeln!(out, "\n⚙️ STRATEGY CONFIGS:")?;
    writeln!(out, "{}", rule('-', 40))?;
    if bundle.strategy_config.is_empty() {
        writeln!(out, "  No strategy configs")?;
    }
    for (name, config) in &bundle.strategy_config {
        write_config_block(out, name, config, "  ")?;
    }

    writeln!(out, "\n🧪 TEST SETTINGS:")?;
    writeln!(out, "{}", rule('-', 40))?;
    write_pairs(out, &bundle.test_settings, "No test settings")?;

    let active = bundle.active_strategies();
    writeln!(out, "\n📊 SUMMARY:")?;
    writeln!(out, "{}", rule('-', 40))?;
    writeln!(out, "  📝 Settings: {}", bundle.settings.len())?;
    writeln!(out, "  🎯 Strategies: {}", bundle.strategies.len())?;
    writeln!(out, "  ⚙️ Strategy configs: {}", bundle.strategy_config.len())?;
    writeln!(out, "  🧪 Test settings: {}", bundle.test_settings.len())?;
    writeln!(out, "  🟢 Active strategies: {}", active.len())?;
    if !active.is_empty() {
        writeln!(out, "    {}", active.join(", "))?;
    }
    Ok(())
}

pub async fn run<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
) -> io::Result<()> {
    console.clear_screen()?;
    console.header(api.base_url())?;
    writeln!(console, "📊 FULL CONFIGURATION")?;
    writeln!(console, "{}", rule('=', 60))?;

    match api.get_all_config().await {
        Ok(bundle) => write_bundle(console, &bundle)?,
        Err(e) => {
            writeln!(console, "❌ Could not load configuration from server: {}", e)?;
            console.pause(PRESS_ENTER_BACK).await?;
            return Ok(());
        }
    }

    writeln!(console, "\n{}", rule('=', 60))?;
    console.pause(PRESS_ENTER_MAIN).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{console, harness, output};
    use remote::testkit::FakeBotState;
    use serde_json::json;

    #[tokio::test]
    async fn test_full_view() {
        let state = FakeBotState::default()
            .with_setting("drawdown", "500")
            .with_strategy("breakout", "active")
            .with_strategy("grid", "active")
            .with_strategy("scalper", "inactive")
            .with_strategy_config("breakout", json!({"symbol": "XAUUSD", "timeframe": "H1"}));
        let h = harness(state).await;
        let mut console = console(&[""]);

        run(&mut console, &h.client).await.unwrap();

        let text = output(&console);
        assert!(text.contains("  drawdown: 500"));
        assert!(text.contains("  🔴 scalper: inactive"));
        assert!(text.contains("  🎯 Strategy: breakout"));
        assert!(text.contains("      symbol: XAUUSD"));
        assert!(text.contains("  No test settings"));
        assert!(text.contains("  🟢 Active strategies: 2"));
        assert!(text.contains("    breakout, grid"));
        assert_eq!(h.server.mutations(), 0);
    }
}
