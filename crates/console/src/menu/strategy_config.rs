//! Per-strategy trading parameters

use super::pick_entry;
use crate::format::or_na;
use crate::input::LineSource;
use crate::term::{rule, Console, PRESS_ENTER_BACK, PRESS_ENTER_CONTINUE};
use remote::{BotApi, StrategyConfig, StrategyParams};
use std::io::{self, Write};
use tracing::info;

const DEFAULT_SYMBOL: &str = "EURUSD";
const DEFAULT_VOLUME: f64 = 0.01;
const DEFAULT_STOP_LOSS: f64 = 50.0;
const DEFAULT_TAKE_PROFIT: f64 = 100.0;
const DEFAULT_TIMEFRAME: &str = "M5";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Add,
    Edit,
    Delete,
    Refresh,
    Back,
}

impl Action {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "1" | "add" => Some(Self::Add),
            "2" | "edit" => Some(Self::Edit),
            "3" | "delete" => Some(Self::Delete),
            "4" | "refresh" => Some(Self::Refresh),
            "0" | "back" => Some(Self::Back),
            _ => None,
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Blank input keeps the current value, or the default when there is none
fn number_or_current(raw: &str, current: Option<f64>, default: f64) -> Option<f64> {
    if raw.is_empty() {
        Some(current.unwrap_or(default))
    } else {
        parse_number(raw)
    }
}

fn display_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn write_invalid_number(out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "❌ Please enter valid numbers for volume, stop loss and take profit!"
    )
}

/// Parameter lines for one strategy; fields the server did not send are skipped
pub(crate) fn write_config_block(
    out: &mut impl Write,
    name: &str,
    config: &StrategyConfig,
    indent: &str,
) -> io::Result<()> {
    writeln!(out, "\n{}🎯 Strategy: {}", indent, name)?;
    if let Some(symbol) = &config.symbol {
        writeln!(out, "{}    symbol: {}", indent, symbol)?;
    }
    if let Some(volume) = config.volume {
        writeln!(out, "{}    volume: {}", indent, volume)?;
    }
    if let Some(stop_loss) = config.stop_loss {
        writeln!(out, "{}    stop_loss: {}", indent, stop_loss)?;
    }
    if let Some(take_profit) = config.take_profit {
        writeln!(out, "{}    take_profit: {}", indent, take_profit)?;
    }
    if let Some(timeframe) = &config.timeframe {
        writeln!(out, "{}    timeframe: {}", indent, timeframe)?;
    }
    Ok(())
}

pub async fn run<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
) -> io::Result<()> {
    loop {
        console.clear_screen()?;
        console.header(api.base_url())?;
        writeln!(console, "⚙️ STRATEGY CONFIG")?;
        writeln!(console, "{}", rule('=', 60))?;

        let bundle = match api.get_all_config().await {
            Ok(bundle) => bundle,
            Err(e) => {
                writeln!(console, "❌ Could not load configuration from server: {}", e)?;
                console.pause(PRESS_ENTER_BACK).await?;
                return Ok(());
            }
        };
        let configs = &bundle.strategy_config;
        let names: Vec<&str> = configs.keys().map(String::as_str).collect();

        writeln!(console, "📋 CURRENT STRATEGY CONFIGS:")?;
        writeln!(console, "{}", rule('-', 60))?;
        if configs.is_empty() {
            writeln!(console, "  No strategy configs")?;
        }
        for (name, config) in configs {
            write_config_block(console, name, config, "")?;
        }

        writeln!(console, "\n🔧 OPTIONS:")?;
        writeln!(console, "  1. ➕ Add strategy config")?;
        writeln!(console, "  2. ✏️ Edit strategy config")?;
        writeln!(console, "  3. 🗑️ Delete strategy config")?;
        writeln!(console, "  4. 🔄 Refresh list")?;
        writeln!(console, "  0. 🔙 Back to main menu")?;
        writeln!(console, "{}", rule('-', 60))?;

        let choice = console.choice("Select option (0-4): ").await?;
        match Action::parse(&choice) {
            Some(Action::Back) => return Ok(()),
            Some(Action::Add) => add_config(console, api).await?,
            Some(Action::Edit) => {
                writeln!(console, "\n✏️ EDIT STRATEGY CONFIG")?;
                writeln!(console, "{}", rule('-', 40))?;
                if names.is_empty() {
                    writeln!(console, "❌ No strategy configs to edit!")?;
                } else {
                    writeln!(console, "Select the config to edit:")?;
                    if let Some(index) = pick_entry(console, &names, "config").await? {
                        let name = names[index];
                        edit_config(console, api, name, &configs[name]).await?;
                    }
                }
            }
            Some(Action::Delete) => delete_config(console, api, &names).await?,
            Some(Action::Refresh) => {
                writeln!(console, "🔄 Refreshing...")?;
                continue;
            }
            None => writeln!(console, "❌ Invalid choice!")?,
        }
        console.pause(PRESS_ENTER_CONTINUE).await?;
    }
}

async fn save<W: Write>(
    out: &mut W,
    api: &dyn BotApi,
    name: &str,
    params: &StrategyParams,
    verb: &str,
) -> io::Result<()> {
    match api.update_strategy_config(name, params).await {
        Ok(()) => {
            info!(strategy = name, symbol = %params.symbol, "Strategy config {}", verb);
            writeln!(out, "✅ Strategy config for {} {}", name, verb)
        }
        Err(e) => writeln!(out, "❌ Failed to save strategy config for {}: {}", name, e),
    }
}

async fn add_config<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
) -> io::Result<()> {
    writeln!(console, "\n➕ ADD STRATEGY CONFIG")?;
    writeln!(console, "{}", rule('-', 40))?;

    let Some(name) = console.read_line("Enter strategy name: ").await? else {
        return Ok(());
    };
    if name.is_empty() {
        writeln!(console, "❌ Strategy name cannot be empty!")?;
        return Ok(());
    }

    let Some(symbol) = console.read_line("Enter symbol (e.g. EURUSD): ").await? else {
        return Ok(());
    };
    let symbol = symbol.to_uppercase();
    if symbol.is_empty() {
        writeln!(console, "❌ Symbol cannot be empty!")?;
        return Ok(());
    }

    let Some(raw) = console.read_line("Enter volume (e.g. 0.01): ").await? else {
        return Ok(());
    };
    let Some(volume) = parse_number(&raw) else {
        return write_invalid_number(console);
    };
    let Some(raw) = console.read_line("Enter stop loss (pips): ").await? else {
        return Ok(());
    };
    let Some(stop_loss) = parse_number(&raw) else {
        return write_invalid_number(console);
    };
    let Some(raw) = console.read_line("Enter take profit (pips): ").await? else {
        return Ok(());
    };
    let Some(take_profit) = parse_number(&raw) else {
        return write_invalid_number(console);
    };
    let Some(timeframe) = console
        .read_line("Enter timeframe (e.g. M5, M15, H1): ")
        .await?
    else {
        return Ok(());
    };

    let params = StrategyParams {
        symbol,
        volume,
        stop_loss,
        take_profit,
        timeframe: timeframe.to_uppercase(),
    };
    save(console, api, &name, &params, "added").await
}

async fn edit_config<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
    name: &str,
    current: &StrategyConfig,
) -> io::Result<()> {
    writeln!(console, "\nEditing config for strategy: {}", name)?;
    writeln!(console, "Enter new values (leave blank to keep the current one):")?;

    let label = format!("Symbol ({}): ", or_na(current.symbol.as_deref()));
    let Some(symbol) = console.read_line(&label).await? else {
        return Ok(());
    };
    let symbol = if symbol.is_empty() {
        current.symbol.clone().unwrap_or_else(|| DEFAULT_SYMBOL.to_string())
    } else {
        symbol.to_uppercase()
    };

    let label = format!("Volume ({}): ", display_number(current.volume));
    let Some(raw) = console.read_line(&label).await? else {
        return Ok(());
    };
    let Some(volume) = number_or_current(&raw, current.volume, DEFAULT_VOLUME) else {
        return write_invalid_number(console);
    };

    let label = format!("Stop Loss ({}): ", display_number(current.stop_loss));
    let Some(raw) = console.read_line(&label).await? else {
        return Ok(());
    };
    let Some(stop_loss) = number_or_current(&raw, current.stop_loss, DEFAULT_STOP_LOSS) else {
        return write_invalid_number(console);
    };

    let label = format!("Take Profit ({}): ", display_number(current.take_profit));
    let Some(raw) = console.read_line(&label).await? else {
        return Ok(());
    };
    let Some(take_profit) = number_or_current(&raw, current.take_profit, DEFAULT_TAKE_PROFIT)
    else {
        return write_invalid_number(console);
    };

    let label = format!("Timeframe ({}): ", or_na(current.timeframe.as_deref()));
    let Some(timeframe) = console.read_line(&label).await? else {
        return Ok(());
    };
    let timeframe = if timeframe.is_empty() {
        current
            .timeframe
            .clone()
            .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string())
    } else {
        timeframe.to_uppercase()
    };

    let params = StrategyParams {
        symbol,
        volume,
        stop_loss,
        take_profit,
        timeframe,
    };
    save(console, api, name, &params, "updated").await
}

/// Clearing writes an emptied record; the server keeps the entry
async fn delete_config<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
    names: &[&str],
) -> io::Result<()> {
    writeln!(console, "\n🗑️ DELETE STRATEGY CONFIG")?;
    writeln!(console, "{}", rule('-', 40))?;

    if names.is_empty() {
        writeln!(console, "❌ No strategy configs to delete!")?;
        return Ok(());
    }

    writeln!(console, "Select the config to delete:")?;
    let Some(index) = pick_entry(console, names, "config").await? else {
        return Ok(());
    };
    let name = names[index];

    let question = format!("Are you sure you want to delete the config for strategy '{}'?", name);
    if !console.confirm(&question).await? {
        writeln!(console, "❌ Deletion cancelled")?;
        return Ok(());
    }

    save(console, api, name, &StrategyParams::cleared(), "deleted").await
}
