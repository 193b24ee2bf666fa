//! bot-config: menu-driven terminal client for a trading bot's config API
//!
//! Usage:
//!   bot-config                          # connect to $BOT_SERVER_URL or localhost:5000
//!   bot-config --server 192.168.1.20    # bare host, port 5000 assumed

use clap::Parser;
use console::{connect, init_logging, normalize_server_address, run_main_menu, Console, StdinLines};
use remote::BotConfigClient;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

#[derive(Parser)]
#[command(name = "bot-config", version = console::APP_VERSION)]
#[command(about = "Manage a trading bot's remote configuration", long_about = None)]
struct Cli {
    /// Server address: host, host:port or full URL (falls back to BOT_SERVER_URL)
    #[arg(long)]
    server: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = remote::api::config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose, "warn");

    tokio::select! {
        result = run(cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                println!("\n❌ Unexpected error: {:#}", e);
                println!("Please check the setup and try again");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\n\n⚠️ Interrupted");
            println!("👋 Goodbye!");
            ExitCode::SUCCESS
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let server = cli
        .server
        .or_else(|| std::env::var("BOT_SERVER_URL").ok())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());
    let address = normalize_server_address(&server)
        .ok_or_else(|| anyhow::anyhow!("server address is empty"))?;
    let timeout = Duration::from_secs(cli.timeout);

    info!(server = %address, timeout_secs = cli.timeout, "bot-config v{} starting", console::APP_VERSION);

    let client = BotConfigClient::with_timeout(&address, timeout)?;
    let mut terminal = Console::new(StdinLines::spawn(), std::io::stdout());

    let client = connect(&mut terminal, client, |addr| {
        BotConfigClient::with_timeout(addr, timeout)
    })
    .await?;
    run_main_menu(&mut terminal, &client).await?;
    Ok(())
}
