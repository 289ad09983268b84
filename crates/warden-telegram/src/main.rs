//! Warden Telegram bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx cargo run -p warden-telegram
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;
use warden_core::BotConfig;
use warden_telegram::WardenBot;

/// Warden - admin-permission gated moderation for Telegram groups
#[derive(Parser, Debug)]
#[command(name = "warden-telegram")]
#[command(about = "Telegram moderation bot with cached admin permission checks")]
struct Args {
    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let filter = match args.verbose {
        0 => "warden_telegram=info,warden_core=info,teloxide=warn",
        1 => "warden_telegram=debug,warden_core=debug,teloxide=info",
        2 => "warden_telegram=trace,warden_core=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BotConfig::from_env()?;

    if let Err(e) = std::fs::create_dir_all(&config.state_dir) {
        tracing::warn!(error = %e, dir = %config.state_dir.display(), "Failed to create state directory");
    }

    let bot = WardenBot::new(config);

    match bot.get_me().await {
        Ok((username, _)) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\nWarden moderation bot");
            println!("   Bot: @{}", username);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\nAdd the bot to a group as admin and send /help");
    println!("   Press Ctrl+C to stop\n");

    bot.start_polling().await?;

    Ok(())
}
