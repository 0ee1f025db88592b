use anyhow::Result;
use log::{error, info};
use std::env;
use std::sync::atomic::Ordering;

use smc_sniper::bot::TradingBot;
use smc_sniper::config::BotConfig;
use smc_sniper::feed::ChartApiFeed;
use smc_sniper::health::{self, HealthState};
use smc_sniper::notify::TelegramNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger with default info level if RUST_LOG not set
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();
    info!("Starting SMC Sniper Bot");

    // Get config file from command line argument or use default
    let args: Vec<String> = env::args().collect();
    let config_file = if args.len() > 1 {
        &args[1]
    } else {
        "config.json"
    };

    info!("Loading configuration from: {}", config_file);
    let config = BotConfig::load_from_file(config_file)?;

    let health = HealthState::new();
    let health_port = config.health_port;
    let health_state = health.clone();
    tokio::spawn(async move {
        if let Err(err) = health::serve(health_state, health_port).await {
            error!("health endpoint failed: {err:#}");
        }
    });

    let feed = ChartApiFeed::new(config.feed.clone())?;
    let notifier = TelegramNotifier::new(&config.telegram);
    let mut bot = TradingBot::new(config, feed, notifier, health);

    // Ctrl-C lowers the running flag; the loop observes it between
    // instruments and during the inter-cycle sleep.
    let running = bot.running_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down SMC Sniper bot...");
            running.store(false, Ordering::SeqCst);
        }
    });

    bot.run().await;

    info!("Bot stopped");
    Ok(())
}
