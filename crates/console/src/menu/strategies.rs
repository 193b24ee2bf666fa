//! Strategy status screen

use super::pick_entry;
use crate::input::LineSource;
use crate::term::{rule, Console, PRESS_ENTER_BACK, PRESS_ENTER_CONTINUE};
use remote::{BotApi, StrategyStatus};
use std::io::{self, Write};
use tracing::info;

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

fn status_glyph(status: &StrategyStatus) -> &'static str {
    if *status == StrategyStatus::Active {
        "🟢"
    } else {
        "🔴"
    }
}

pub(crate) fn write_strategy_line(
    out: &mut impl Write,
    name: &str,
    status: &StrategyStatus,
) -> io::Result<()> {
    writeln!(out, "  {} {}: {}", status_glyph(status), name, status)
}

pub async fn run<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
) -> io::Result<()> {
    loop {
        console.clear_screen()?;
        console.header(api.base_url())?;
        writeln!(console, "🎯 STRATEGIES")?;
        writeln!(console, "{}", rule('=', 60))?;

        let bundle = match api.get_all_config().await {
            Ok(bundle) => bundle,
            Err(e) => {
                writeln!(console, "❌ Could not load configuration from server: {}", e)?;
                console.pause(PRESS_ENTER_BACK).await?;
                return Ok(());
            }
        };
        let names: Vec<&str> = bundle.strategies.keys().map(String::as_str).collect();

        writeln!(console, "📋 CURRENT STRATEGIES:")?;
        writeln!(console, "{}", rule('-', 60))?;
        if bundle.strategies.is_empty() {
            writeln!(console, "  No strategies")?;
        }
        for (name, status) in &bundle.strategies {
            write_strategy_line(console, name, status)?;
        }

        writeln!(console, "\n🔧 OPTIONS:")?;
        writeln!(console, "  1. ➕ Add strategy")?;
        writeln!(console, "  2. ✏️ Change strategy status")?;
        writeln!(console, "  3. 🗑️ Delete strategy")?;
        writeln!(console, "  4. 🔄 Refresh list")?;
        writeln!(console, "  0. 🔙 Back to main menu")?;
        writeln!(console, "{}", rule('-', 60))?;

        let choice = console.choice("Select option (0-4): ").await?;
        match Action::parse(&choice) {
            Some(Action::Back) => return Ok(()),
            Some(Action::Add) => add_strategy(console, api).await?,
            Some(Action::Edit) => edit_strategy(console, api, &names).await?,
            Some(Action::Delete) => delete_strategy(console, api, &names).await?,
            Some(Action::Refresh) => {
                writeln!(console, "🔄 Refreshing...")?;
                continue;
            }
            None => writeln!(console, "❌ Invalid choice!")?,
        }
        console.pause(PRESS_ENTER_CONTINUE).await?;
    }
}

/// Offer the selectable statuses; `None` on a bad pick
async fn select_status<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    label: &str,
) -> io::Result<Option<StrategyStatus>> {
    writeln!(console, "Strategy status:")?;
    writeln!(console, "  1. active - Enabled")?;
    writeln!(console, "  2. inactive - Paused")?;
    writeln!(console, "  3. test - Test mode")?;

    let Some(raw) = console.read_line(label).await? else {
        return Ok(None);
    };
    let status = super::parse_index(&raw, StrategyStatus::SELECTABLE.len())
        .map(|i| StrategyStatus::SELECTABLE[i].clone());
    if status.is_none() {
        writeln!(console, "❌ Invalid choice!")?;
    }
    Ok(status)
}

async fn add_strategy<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
) -> io::Result<()> {
    writeln!(console, "\n➕ ADD STRATEGY")?;
    writeln!(console, "{}", rule('-', 40))?;

    let Some(name) = console.read_line("Enter strategy name: ").await? else {
        return Ok(());
    };
    if name.is_empty() {
        writeln!(console, "❌ Strategy name cannot be empty!")?;
        return Ok(());
    }

    writeln!(console)?;
    let Some(status) = select_status(console, "Select status (1-3): ").await? else {
        return Ok(());
    };

    match api.update_strategy(&name, &status).await {
        Ok(()) => {
            info!(strategy = %name, status = %status, "Strategy added");
            writeln!(console, "✅ Strategy {} added", name)?;
        }
        Err(e) => writeln!(console, "❌ Failed to add strategy {}: {}", name, e)?,
    }
    Ok(())
}

async fn edit_strategy<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
    names: &[&str],
) -> io::Result<()> {
    writeln!(console, "\n✏️ CHANGE STRATEGY STATUS")?;
    writeln!(console, "{}", rule('-', 40))?;

    if names.is_empty() {
        writeln!(console, "❌ No strategies to update!")?;
        return Ok(());
    }

    writeln!(console, "Select the strategy to update:")?;
    let Some(index) = pick_entry(console, names, "strategy").await? else {
        return Ok(());
    };
    let name = names[index];

    writeln!(console, "\nUpdating strategy: {}", name)?;
    let Some(status) = select_status(console, "Select new status (1-3): ").await? else {
        return Ok(());
    };

    match api.update_strategy(name, &status).await {
        Ok(()) => {
            info!(strategy = name, status = %status, "Strategy status changed");
            writeln!(console, "✅ Strategy {} is now {}", name, status)?;
        }
        Err(e) => writeln!(console, "❌ Failed to update strategy {}: {}", name, e)?,
    }
    Ok(())
}

/// Deletion writes the `deleted` status; the server keeps the entry
async fn delete_strategy<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
    names: &[&str],
) -> io::Result<()> {
    writeln!(console, "\n🗑️ DELETE STRATEGY")?;
    writeln!(console, "{}", rule('-', 40))?;

    if names.is_empty() {
        writeln!(console, "❌ No strategies to delete!")?;
        return Ok(());
    }

    writeln!(console, "Select the strategy to delete:")?;
    let Some(index) = pick_entry(console, names, "strategy").await? else {
        return Ok(());
    };
    let name = names[index];

    let question = format!("Are you sure you want to delete strategy '{}'?", name);
    if !console.confirm(&question).await? {
        writeln!(console, "❌ Deletion cancelled")?;
        return Ok(());
    }

    match api.update_strategy(name, &StrategyStatus::Deleted).await {
        Ok(()) => {
            info!(strategy = name, "Strategy deleted");
            writeln!(console, "✅ Strategy {} deleted", name)?;
        }
        Err(e) => writeln!(console, "❌ Failed to delete strategy {}: {}", name, e)?,
    }
    Ok(())
}
