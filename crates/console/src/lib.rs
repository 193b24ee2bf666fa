//! Bot Console: operator terminal for a remote trading bot
//!
//! Provides:
//! - Nested configuration menus over the bot's REST API
//! - Realtime account dashboard with profit / drawdown analysis
//! - Line input abstraction (stdin or scripted) and console helpers

pub mod dashboard;
pub mod format;
pub mod input;
pub mod logging;
pub mod menu;
pub mod term;

#[cfg(test)]
mod testutil;

// Re-exports for convenience
pub use input::{LineSource, ScriptedLines, StdinLines};
pub use logging::init_logging;
pub use menu::{connect, normalize_server_address, run_main_menu};
pub use term::{Console, APP_VERSION};
