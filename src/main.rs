#![recursion_limit = "256"]
//! # Main Entry Point
//!
//! Wires the bot together:
//! - Domain: Settings and Types
//! - Infrastructure: Matrix transport, Mozart search client
//! - Application: Router and polling Worker
//! - Interface: Command Handlers
//!

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::application::router::CommandRouter;
use crate::application::worker::Worker;
use crate::domain::config::{DEFAULT_SETTINGS_PATH, Settings};
use crate::domain::traits::MessageChannel;
use crate::infrastructure::matrix::MatrixService;
use crate::infrastructure::search::{Backoff, SearchClient};
use crate::interface::commands::CommandRegistry;
use crate::strings::logs;

const LOG_FILE: &str = "opsbot.log";

#[derive(Parser, Debug)]
#[command(name = "opsbot", about = "HySDS operations chat bot")]
struct Args {
    /// Path to the settings file.
    #[arg(long, env = "OPSBOT_SETTINGS", default_value = DEFAULT_SETTINGS_PATH)]
    settings: String,

    /// Bot credential. Overrides BOT_TOKEN from the settings file.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// The bot's user id. Overrides BOT_ID from the settings file.
    #[arg(long, env = "BOT_ID")]
    bot_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load Settings
    let settings = Settings::load(&args.settings)
        .with_context(|| format!("Failed to load settings from {}", args.settings))?;

    // 2. Logging Setup
    let _guard = init_logging(&settings.log_dir)?;
    tracing::info!("{}", logs::STARTING);
    tracing::info!(
        "{}",
        logs::settings_loaded(&args.settings, settings.mozart_es_url.len())
    );

    let bot_token = args
        .bot_token
        .or_else(|| settings.bot_token.clone())
        .context("BOT_TOKEN is not set (flag, environment, or settings file)")?;
    let bot_id = args
        .bot_id
        .or_else(|| settings.bot_id.clone())
        .context("BOT_ID is not set (flag, environment, or settings file)")?;

    // 3. Initialize Infrastructure
    let settings = Arc::new(settings);
    let index = SearchClient::new(Backoff::from_settings(&settings), settings.http_timeout())
        .context("Failed to build HTTP client")?;

    let mut chat = MatrixService::new(
        bot_id.clone(),
        bot_token,
        settings.matrix_homeserver.clone(),
    );
    if let Err(e) = chat.connect().await {
        let message = logs::connect_failed(&e.to_string());
        tracing::error!("{}", message);
        anyhow::bail!(message);
    }
    tracing::info!("{}", logs::CONNECTED);

    // 4. Application Components
    let router = CommandRouter::new(
        settings.clone(),
        Arc::new(CommandRegistry::builtin()),
        Arc::new(index),
        &bot_id,
    );

    // 5. Event Loop
    let worker = Worker::new(&chat, &router, settings.poll_interval());
    worker
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}

/// Console plus `<log_dir>/opsbot.log`, recreated on every start.
fn init_logging(log_dir: &str) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let dir = Path::new(log_dir);
    if !dir.exists() {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {log_dir}"))?;
    }

    // Clear previous session log
    let log_path = dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(
            "info,matrix_sdk=warn,matrix_sdk_base=warn,matrix_sdk_crypto=error,ruma=warn,hyper=warn",
        )
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(guard)
}
