//! Anitrack Telegram Bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx cargo run -p anitrack-telegram
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use anitrack_catalog::{ShikimoriClient, DEFAULT_ENDPOINT};
use anitrack_core::config;
use anitrack_persistence::{JsonSubscriptionStore, JsonUserStore};
use anitrack_telegram::{Result, TelegramBot};
use tracing_subscriber::EnvFilter;

/// Anitrack Telegram Bot - new episode notifications for anime you follow
#[derive(Parser, Debug)]
#[command(name = "anitrack-telegram")]
#[command(about = "Telegram bot that notifies subscribers about newly aired anime episodes")]
struct Args {
    /// Seconds between notification checks
    #[arg(short, long, env = config::POLL_INTERVAL_ENV, default_value_t = config::DEFAULT_POLL_INTERVAL_SECS)]
    interval: u64,

    /// Catalog GraphQL endpoint
    #[arg(long, env = config::CATALOG_URL_ENV, default_value = DEFAULT_ENDPOINT)]
    catalog_url: String,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from the state directory first, so the
    // token and overrides are visible to clap's env fallbacks below.
    let env_path = config::env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize logging based on verbosity
    let filter = match args.verbose {
        0 => "anitrack_telegram=info,anitrack_core=info,anitrack_catalog=info,anitrack_persistence=info,teloxide=warn",
        1 => "anitrack_telegram=debug,anitrack_core=debug,anitrack_catalog=debug,anitrack_persistence=debug,teloxide=info",
        2 => "anitrack_telegram=trace,anitrack_core=trace,anitrack_catalog=trace,anitrack_persistence=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let interval = Duration::from_secs(args.interval.max(1));
    let bot = build_bot(&args.catalog_url, interval)?;

    // Get bot info
    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[robot] Anitrack Telegram Bot");
            println!("   Bot: @{}", username);
            println!("   State: {}", config::state_dir().display());
            println!("   Checking for new episodes every {}s", interval.as_secs());
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e);
        }
    }

    println!("\n[phone] Open Telegram and send /start to begin");
    println!("   Press Ctrl+C to stop\n");

    bot.run().await?;

    Ok(())
}

/// Opens the stores and catalog client and wires them into a bot.
fn build_bot(catalog_url: &str, interval: Duration) -> Result<TelegramBot> {
    config::ensure_runtime_state_dir()?;

    let users = Arc::new(JsonUserStore::open(config::users_file())?);
    let subscriptions = Arc::new(JsonSubscriptionStore::open(config::subscriptions_file())?);
    let catalog = Arc::new(ShikimoriClient::with_endpoint(catalog_url)?);

    Ok(TelegramBot::new(users, subscriptions, catalog)?.with_poll_interval(interval))
}
