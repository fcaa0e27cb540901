use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use sticker_favourites::error::BotError;
use sticker_favourites::models::UserId;

const CONFIG_ENV: &str = "STICKER_FAVOURITES_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "data/config.toml";

#[derive(Debug, Deserialize, Clone)]
#[serde(from = "RawConfig")]
pub struct Config {
    pub telegram_bot_token: String,
    pub allowed_user_ids: HashSet<UserId>,
    pub store_path: PathBuf,
}

/// Intermediate type for deserialization (Vec → `HashSet` conversion).
#[derive(Deserialize)]
struct RawConfig {
    #[serde(alias = "token")]
    telegram_bot_token: String,
    #[serde(alias = "users")]
    allowed_user_ids: Vec<UserId>,
    #[serde(default = "default_store_path")]
    store_path: PathBuf,
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        Self {
            telegram_bot_token: raw.telegram_bot_token,
            allowed_user_ids: raw.allowed_user_ids.into_iter().collect(),
            store_path: raw.store_path,
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data").join("db.json")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = config_file_path();
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            BotError::ConfigInvalid(format!(
                "Cannot read config at {}: {}",
                config_path.display(),
                e
            ))
        })?;
        let config: Self = toml::from_str(&contents).map_err(|e| {
            BotError::ConfigInvalid(format!("Invalid TOML in {}: {}", config_path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.telegram_bot_token.trim().is_empty() {
            anyhow::bail!("telegram_bot_token must not be empty");
        }
        if self.allowed_user_ids.is_empty() {
            anyhow::bail!("allowed_user_ids must have at least one entry");
        }
        if self.store_path.is_dir() {
            anyhow::bail!(
                "store_path must be a file, not a directory: {}",
                self.store_path.display()
            );
        }
        Ok(())
    }

    pub fn is_allowed(&self, user_id: UserId) -> bool {
        self.allowed_user_ids.contains(&user_id)
    }

    /// Returns the sender if their message should be handled: only
    /// allow-listed users in private chats are served.
    pub fn accepts(&self, sender: Option<UserId>, private_chat: bool) -> Option<UserId> {
        let user_id = sender?;
        if !self.is_allowed(user_id) {
            tracing::warn!(user_id, "Unauthorized message attempt");
            return None;
        }
        private_chat.then_some(user_id)
    }
}

fn config_file_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}
