//! Realtime MT5 account dashboard
//!
//! Redraws account, open positions and daily risk figures every 30 seconds
//! until the operator presses Enter. The keypress only raises a flag; the
//! loop looks at it between fetches and while waiting, so a request in
//! flight always completes.

use crate::format::{amount, money, or_na, percent};
use crate::input::LineSource;
use crate::term::{rule, write_header, Console, CLEAR_SCREEN, PRESS_ENTER_MAIN};
use remote::analytics::{analyze, BalanceFloor, DrawdownStatus, RiskLimits, TargetStatus};
use remote::{AccountSnapshot, BotApi};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

const REFRESH_INTERVAL: Duration = Duration::from_secs(30);
const RETRY_DELAY: Duration = Duration::from_secs(3);
const STOP_CHECK_MS: u64 = 500;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Sleep up to `total`, waking every half second to check `stop`
async fn wait_unless_stopped(stop: &AtomicBool, total: Duration) {
    let deadline = Instant::now() + total;
    while Instant::now() < deadline {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        tokio::time::sleep(remaining.min(Duration::from_millis(STOP_CHECK_MS))).await;
    }
}

pub async fn run<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
) -> io::Result<()> {
    writeln!(console, "🔄 Starting realtime updates every 30 seconds...")?;

    let stop = AtomicBool::new(false);
    let (input, out) = console.parts();

    let keypress = async {
        // Enter or end of input both stop the dashboard
        input.next_line().await;
        stop.store(true, Ordering::Relaxed);
        std::future::pending::<()>().await
    };

    let result = tokio::select! {
        biased;
        result = poll_loop(out, api, &stop) => result,
        _ = keypress => Ok(()),
    };
    result?;

    writeln!(console, "\n✅ Realtime updates stopped")?;
    console.pause(PRESS_ENTER_MAIN).await?;
    Ok(())
}

async fn poll_loop<W: Write>(out: &mut W, api: &dyn BotApi, stop: &AtomicBool) -> io::Result<()> {
    let mut update_count: usize = 0;

    while !stop.load(Ordering::Relaxed) {
        update_count += 1;

        out.write_all(CLEAR_SCREEN.as_bytes())?;
        write_header(out, api.base_url())?;
        writeln!(out, "💰 MT5 ACCOUNT INFO (REALTIME)")?;
        writeln!(out, "{}", rule('=', 60))?;
        writeln!(
            out,
            "{} Updating... (#{})",
            SPINNER[update_count % SPINNER.len()],
            update_count
        )?;
        out.flush()?;

        let snapshot = match api.get_account_info().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(error = %e, "Account info fetch failed");
                writeln!(out, "❌ Could not fetch MT5 account info: {}", e)?;
                writeln!(out, "Possible causes:")?;
                writeln!(out, "  - The bot has not started")?;
                writeln!(out, "  - MT5 is not connected")?;
                writeln!(out, "  - The server does not support this API")?;
                writeln!(out, "\n🔄 Retrying...")?;
                out.flush()?;
                wait_unless_stopped(stop, RETRY_DELAY).await;
                continue;
            }
        };

        let settings = match api.get_all_config().await {
            Ok(bundle) => Some(bundle.settings),
            Err(e) => {
                debug!(error = %e, "Settings fetch failed, skipping analysis");
                None
            }
        };

        write_snapshot(out, &snapshot, settings.as_ref())?;

        writeln!(out, "\n{}", rule('=', 60))?;
        writeln!(
            out,
            "🔄 Update #{} - every 30 seconds - press Enter to stop",
            update_count
        )?;
        out.flush()?;

        wait_unless_stopped(stop, REFRESH_INTERVAL).await;
    }

    Ok(())
}

/// Render one snapshot. Analysis needs both the account block and a
/// non-empty settings bucket.
pub fn write_snapshot(
    out: &mut impl Write,
    snapshot: &AccountSnapshot,
    settings: Option<&BTreeMap<String, String>>,
) -> io::Result<()> {
    if let Some(account) = &snapshot.account {
        writeln!(out, "\n📊 ACCOUNT:")?;
        writeln!(out, "  🆔 Login: {}", or_na(account.login.as_deref()))?;
        writeln!(out, "  🏦 Server: {}", or_na(account.server.as_deref()))?;
        writeln!(out, "  💰 Balance: {}", money(account.balance))?;
        writeln!(out, "  💵 Equity: {}", money(account.equity))?;
        writeln!(out, "  📈 Profit: {}", money(account.profit))?;
        writeln!(out, "  💳 Margin: {}", money(account.margin))?;
        writeln!(out, "  🔒 Free Margin: {}", money(account.free_margin))?;
        writeln!(out, "  📊 Margin Level: {}", percent(account.margin_level))?;
        writeln!(out, "  🎯 Currency: {}", or_na(account.currency.as_deref()))?;
    }

    if let Some(positions) = &snapshot.positions {
        writeln!(out, "\n📋 OPEN POSITIONS ({}):", positions.len())?;
        if positions.is_empty() {
            writeln!(out, "  No open positions")?;
        } else {
            writeln!(
                out,
                "{:<10} {:<10} {:<6} {:<8} {:<10} {:<12} {:<15}",
                "Ticket", "Symbol", "Type", "Volume", "Price", "Profit", "Comment"
            )?;
            writeln!(out, "{}", rule('-', 80))?;
            for p in positions {
                let profit = format!("${:<11}", format!("{:.2}", p.profit));
                let profit = if p.profit > Decimal::ZERO {
                    format!("📈 {}", profit)
                } else if p.profit < Decimal::ZERO {
                    format!("📉 {}", profit)
                } else {
                    profit
                };
                writeln!(
                    out,
                    "{:<10} {:<10} {:<6} {:<8} {:<10} {} {:<15}",
                    or_na(p.ticket.as_deref()),
                    or_na(p.symbol.as_deref()),
                    p.side.as_str(),
                    format!("{:.2}", p.volume),
                    format!("{:.5}", p.price_open),
                    profit,
                    or_na(p.comment.as_deref()),
                )?;
            }
        }
    }

    if let Some(summary) = &snapshot.summary {
        writeln!(out, "\n📈 SUMMARY:")?;
        writeln!(out, "  📊 Open positions: {}", summary.total_positions)?;
        writeln!(out, "  💰 Total profit: {}", money(summary.total_profit))?;
        writeln!(out, "  📈 Winning positions: {}", summary.profitable_positions)?;
        writeln!(out, "  📉 Losing positions: {}", summary.losing_positions)?;

        if let (Some(settings), Some(account)) = (settings, &snapshot.account) {
            if !settings.is_empty() {
                write_analysis(out, account.balance, account.profit, settings)?;
            }
        }
    }

    if let Some(timestamp) = &snapshot.timestamp {
        writeln!(out, "\n⏰ Updated at: {}", timestamp)?;
    }
    Ok(())
}

fn write_analysis(
    out: &mut impl Write,
    balance: Decimal,
    current_profit: Decimal,
    settings: &BTreeMap<String, String>,
) -> io::Result<()> {
    let limits = RiskLimits::from_settings(settings);
    let analysis = analyze(balance, &limits);

    writeln!(out, "\n⚙️ LIMITS:")?;
    writeln!(out, "  💰 Balance at 5AM: {}", money(limits.balance_at_reference))?;
    writeln!(out, "  🔒 Min Balance: {}", money(limits.min_balance))?;
    writeln!(out, "  📉 Drawdown Limit: {}", money(limits.drawdown_limit))?;
    writeln!(out, "  🎯 Daily Profit Target: {}", money(limits.daily_profit_target))?;
    writeln!(out, "  📊 Current Profit: {}", money(current_profit))?;

    writeln!(out, "\n📊 ANALYSIS:")?;
    writeln!(out, "  📈 Daily Profit: {}", money(analysis.daily_profit))?;
    writeln!(out, "  📉 Drawdown Used: {}", money(analysis.drawdown_used))?;

    match analysis.target {
        TargetStatus::Reached => writeln!(out, "  🎯 Daily Target: ✅ TARGET REACHED")?,
        TargetStatus::Remaining(left) => {
            writeln!(out, "  🎯 Daily Target: ⏳ ${} to go", amount(left))?
        }
    }
    match analysis.drawdown {
        DrawdownStatus::Exceeded => writeln!(out, "  📉 Drawdown: ⚠️ LIMIT EXCEEDED")?,
        DrawdownStatus::Remaining(left) => {
            writeln!(out, "  📉 Drawdown: ✅ ${} left", amount(left))?
        }
    }
    match analysis.floor {
        BalanceFloor::Below => writeln!(out, "  🔒 Min Balance: ⚠️ BELOW LIMIT")?,
        BalanceFloor::Safe => writeln!(out, "  🔒 Min Balance: ✅ SAFE")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{console, harness, output};
    use remote::testkit::{FakeBotState, StatusCode};

    fn fixture() -> FakeBotState {
        FakeBotState::default()
            .with_setting("balanceat5am", "10000")
            .with_setting("minbalance", "9000")
            .with_setting("drawdown", "500")
            .with_setting("dailyprofittarget", "300")
    }

    #[tokio::test]
    async fn test_renders_once_then_stops() {
        let h = harness(fixture()).await;
        // Input closed: the keypress listener fires right away
        let mut console = console(&[]);

        run(&mut console, &h.client).await.unwrap();

        let text = output(&console);
        assert!(text.contains("(#1)"));
        assert!(!text.contains("(#2)"));
        assert!(text.contains("  🆔 Login: 5012345"));
        assert!(text.contains("  💰 Balance: $10,250.50"));
        assert!(text.contains("  📊 Margin Level: 8,531.67%"));
        assert!(text.contains("📋 OPEN POSITIONS (2):"));
        assert!(text.contains("📉 $-20.50"));
        assert!(text.contains("XAUUSD     SELL"));
        assert!(text.contains("  📈 Daily Profit: $250.50"));
        assert!(text.contains("  🎯 Daily Target: ⏳ $49.50 to go"));
        assert!(text.contains("  📉 Drawdown: ✅ $750.50 left"));
        assert!(text.contains("  🔒 Min Balance: ✅ SAFE"));
        assert!(text.contains("✅ Realtime updates stopped"));
        assert_eq!(h.server.mutations(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_retries_until_stopped() {
        let mut state = fixture();
        state.account_status = StatusCode::SERVICE_UNAVAILABLE;
        let h = harness(state).await;
        let mut console = console(&[]);

        run(&mut console, &h.client).await.unwrap();

        let text = output(&console);
        assert!(text.contains("❌ Could not fetch MT5 account info"));
        assert!(text.contains("  - MT5 is not connected"));
        assert!(!text.contains("📊 ACCOUNT:"));
        assert!(text.contains("✅ Realtime updates stopped"));
    }

    #[test]
    fn test_no_analysis_without_settings() {
        let snapshot: AccountSnapshot =
            serde_json::from_value(remote::testkit::FakeBotState::default().account).unwrap();
        let mut out = Vec::new();

        write_snapshot(&mut out, &snapshot, Some(&BTreeMap::new())).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("📈 SUMMARY:"));
        assert!(!text.contains("ANALYSIS"));
        assert!(text.contains("⏰ Updated at: 2024-01-03T10:00:00"));
    }

    #[test]
    fn test_limit_breaches() {
        let snapshot: AccountSnapshot = serde_json::from_value(serde_json::json!({
            "account": {"balance": 8800, "profit": -40},
            "summary": {"total_positions": 0}
        }))
        .unwrap();
        let settings: BTreeMap<String, String> = [
            ("balanceat5am", "10000"),
            ("minbalance", "9000"),
            ("drawdown", "500"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let mut out = Vec::new();

        write_snapshot(&mut out, &snapshot, Some(&settings)).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  🆔 Login: N/A"));
        assert!(text.contains("  📉 Drawdown Used: $1,200.00"));
        assert!(text.contains("  📉 Drawdown: ⚠️ LIMIT EXCEEDED"));
        assert!(text.contains("  🔒 Min Balance: ⚠️ BELOW LIMIT"));
        // No target configured and the day is down
        assert!(text.contains("  🎯 Daily Target: ⏳ $1,200.00 to go"));
    }
}
