//! Bot configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Defaults match the original deployment.
const DEFAULT_WELCOME_IMAGE_URL: &str = "https://envs.sh/C_W.jpg";
const DEFAULT_CREATOR_URL: &str = "https://t.me/zerocreations";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN must be set in the environment")]
    MissingToken,
}

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot credential. Required; there is deliberately no
    /// embedded fallback.
    pub bot_token: String,
    /// Directory that holds per-job scratch directories
    pub downloads_dir: PathBuf,
    /// Liveness probe port
    pub port: u16,
    /// Liveness probe path
    pub healthcheck_path: String,
    /// Maximum search results presented to the user
    pub search_limit: usize,
    /// `getUpdates` long-poll timeout
    pub poll_timeout: Duration,
    /// Graceful shutdown drain timeout
    pub shutdown_timeout: Duration,
    /// Image sent with the /start welcome message
    pub welcome_image_url: String,
    /// Contact link on the welcome keyboard
    pub creator_url: String,
}

impl BotConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("BOT_TOKEN")
            .ok()
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            bot_token,
            downloads_dir: PathBuf::from(
                std::env::var("DOWNLOADS_DIR").unwrap_or_else(|_| "downloads".to_string()),
            ),
            port: env_or("PORT", 8080),
            healthcheck_path: std::env::var("HEALTHCHECK_PATH")
                .unwrap_or_else(|_| "/healthcheck".to_string()),
            search_limit: env_or("SEARCH_LIMIT", 5),
            poll_timeout: Duration::from_secs(env_or("POLL_TIMEOUT_SECS", 30)),
            shutdown_timeout: Duration::from_secs(env_or("SHUTDOWN_TIMEOUT_SECS", 30)),
            welcome_image_url: std::env::var("WELCOME_IMAGE_URL")
                .unwrap_or_else(|_| DEFAULT_WELCOME_IMAGE_URL.to_string()),
            creator_url: std::env::var("CREATOR_URL")
                .unwrap_or_else(|_| DEFAULT_CREATOR_URL.to_string()),
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
