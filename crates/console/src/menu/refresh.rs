//! One-shot bot refresh command

use crate::input::LineSource;
use crate::term::{rule, Console, PRESS_ENTER_MAIN};
use remote::BotApi;
use std::io::{self, Write};
use tracing::{debug, info};

pub async fn run<I: LineSource, W: Write>(
    console: &mut Console<I, W>,
    api: &dyn BotApi,
) -> io::Result<()> {
    console.clear_screen()?;
    console.header(api.base_url())?;
    writeln!(console, "🔄 REFRESH BOT")?;
    writeln!(console, "{}", rule('=', 60))?;
    writeln!(console, "This sends a refresh command so the bot will:")?;
    writeln!(console, "  - reload its configuration from the database")?;
    writeln!(console, "  - restart its strategies")?;
    writeln!(console, "  - clear caches and temporary files")?;
    writeln!(console, "  - keep running with the latest configuration")?;
    writeln!(console, "{}", rule('-', 60))?;

    if console.confirm("Are you sure you want to refresh the bot?").await? {
        writeln!(console, "\n🔄 Sending refresh command...")?;
        match api.refresh_bot().await {
            Ok(message) => {
                info!(message = %message, "Bot refreshed");
                writeln!(console, "✅ Bot refreshed!")?;
                writeln!(console, "📝 Message: {}", message)?;
            }
            Err(e) => {
                debug!(error = %e, "Bot refresh failed");
                writeln!(console, "❌ Bot refresh failed!")?;
                writeln!(console, "📝 Error: {}", e)?;
            }
        }
    } else {
        writeln!(console, "❌ Refresh cancelled")?;
    }

    writeln!(console, "\n{}", rule('=', 60))?;
    console.pause(PRESS_ENTER_MAIN).await?;
    Ok(())
}
