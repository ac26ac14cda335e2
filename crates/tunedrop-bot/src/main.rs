//! TuneDrop bot binary.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tunedrop_bot::{health, BotConfig, BotController};
use tunedrop_jobs::JobStore;
use tunedrop_media::{Id3Tagger, YtDlpResolver};
use tunedrop_telegram::TelegramGateway;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("tunedrop=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting tunedrop-bot");

    // Load configuration
    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        downloads_dir = %config.downloads_dir.display(),
        port = config.port,
        "Bot config loaded"
    );

    if let Err(e) = tokio::fs::create_dir_all(&config.downloads_dir).await {
        error!(
            "Failed to create downloads directory {}: {}",
            config.downloads_dir.display(),
            e
        );
        std::process::exit(1);
    }

    // Liveness probe runs alongside, independent of the bot
    let probe_port = config.port;
    let probe_path = config.healthcheck_path.clone();
    tokio::spawn(async move {
        if let Err(e) = health::serve(probe_port, probe_path).await {
            error!("Liveness probe server exited: {}", e);
        }
    });

    let gateway = Arc::new(TelegramGateway::new(&config.bot_token));
    let resolver = Arc::new(YtDlpResolver::new());
    let tagger = Arc::new(Id3Tagger::new());
    let store = Arc::new(JobStore::new());
    let controller = Arc::new(BotController::new(
        gateway.clone(),
        resolver,
        tagger,
        Arc::clone(&store),
        config.clone(),
    ));

    // Long-poll updates, handling each in its own task so a slow pipeline
    // never blocks intake
    let mut offset = 0i64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
            polled = gateway.poll_updates(offset, config.poll_timeout.as_secs()) => {
                match polled {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            let controller = Arc::clone(&controller);
                            tokio::spawn(async move {
                                controller.handle_update(update).await;
                            });
                        }
                    }
                    Err(e) => {
                        warn!("Polling failed: {}", e);
                        tokio::time::sleep(Duration::from_secs(3)).await;
                    }
                }
            }
        }
    }

    // Drain in-flight jobs before exiting so artifacts get released
    let deadline = Instant::now() + config.shutdown_timeout;
    while store.active_count() > 0 && Instant::now() < deadline {
        info!("Waiting for {} active job(s) to finish", store.active_count());
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    if store.active_count() > 0 {
        warn!(
            "Shutdown timeout reached with {} job(s) still active",
            store.active_count()
        );
    }

    info!("Bot shutdown complete");
}
