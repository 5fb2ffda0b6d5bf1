use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Top-level configuration for the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrosspostConfig {
    pub telegram: TelegramConfig,
    pub slack: SlackConfig,
    /// Path of the persisted channel-mapping file (full-file JSON rewrite
    /// on every mutation).
    pub mappings_file: PathBuf,
}

impl Default for CrosspostConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            slack: SlackConfig::default(),
            mappings_file: PathBuf::from("mappings.json"),
        }
    }
}

/// Telegram transport configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Slack transport configuration (Socket Mode).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Bot token (`xoxb-…`), used for the Web API.
    #[serde(serialize_with = "serialize_secret")]
    pub bot_token: Secret<String>,

    /// App-level token (`xapp-…`), used for the Socket Mode connection.
    #[serde(serialize_with = "serialize_secret")]
    pub app_token: Secret<String>,

    /// Slack user ids allowed to run mapping mutation commands. Listing is
    /// open to everyone; an empty list disables mutations entirely.
    pub admin_users: Vec<String>,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: Secret::new(String::new()),
            app_token: Secret::new(String::new()),
            admin_users: Vec::new(),
        }
    }
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"[REDACTED]")
            .field("app_token", &"[REDACTED]")
            .field("admin_users", &self.admin_users)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
