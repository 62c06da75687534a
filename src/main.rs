//! Calendar Bot - posts Slack reminders for upcoming calendar events
//!
//! Polls a calendar, posts a reminder per event about to start, and uses an
//! expiring insert-once cache so each event is announced once per cooldown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use calendarbot::api::create_router;
use calendarbot::auth::{FileConfigProvider, FileTokenProvider, RefreshingTokenProvider};
use calendarbot::calendar::GoogleCalendarClient;
use calendarbot::slack::SlackClient;
use calendarbot::{spawn_poll_task, AppState, Bot, BotSettings, Config, MemoryCache};

/// Main entry point for the calendar bot.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build credential providers, API clients, cache and bot
/// 4. Start background poll task
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calendarbot=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Calendar Bot");

    let config = Config::from_env();
    info!(
        "Configuration loaded: calendar={}, channel={}, port={}, poll_interval={}s, lookahead={}s, cooldown={}s",
        config.calendar_name,
        config.slack_channel,
        config.server_port,
        config.poll_interval,
        config.lookahead,
        config.notify_cooldown
    );
    if config.slack_token.is_empty() || config.slack_channel.is_empty() {
        warn!("SLACK_TOKEN or SLACK_CHANNEL is not set, posting will fail");
    }

    let tokens = Arc::new(RefreshingTokenProvider::new(
        Arc::new(FileConfigProvider::new(&config.oauth2_config_file)),
        Arc::new(FileTokenProvider::new(&config.oauth2_token_file)),
    ));
    let bot = Bot::new(
        Arc::new(MemoryCache::new()),
        Arc::new(GoogleCalendarClient::new(tokens)),
        Arc::new(SlackClient::new(&config.slack_token)),
        BotSettings::from_config(&config),
    );
    info!("Notifier initialized");

    let poll_handle = spawn_poll_task(bot.clone(), config.poll_interval(), config.lookahead());
    info!("Background poll task started");

    let app = create_router(AppState::from_config(bot, &config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(poll_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the poll task and allows graceful shutdown.
async fn shutdown_signal(poll_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    poll_handle.abort();
    warn!("Poll task aborted");
}
