//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the service base URLs, the expense user id, the last used
//! username and the token storage backend.
//!
//! Configuration is stored at `~/.config/spendtrack/config.json`. Values can
//! be overridden with `SPENDTRACK_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "spendtrack";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_AUTH_BASE_URL: &str = "http://localhost:9898";
const DEFAULT_EXPENSE_BASE_URL: &str = "http://localhost:9820";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_AUTH_URL: &str = "SPENDTRACK_AUTH_URL";
pub const ENV_EXPENSE_URL: &str = "SPENDTRACK_EXPENSE_URL";
pub const ENV_USER_ID: &str = "SPENDTRACK_USER_ID";
pub const ENV_TOKEN_STORAGE: &str = "SPENDTRACK_TOKEN_STORAGE";

/// Where the token pair is persisted between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for TokenStorage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenStorage::File),
            "keyring" => Ok(TokenStorage::Keyring),
            "memory" => Ok(TokenStorage::Memory),
            other => Err(anyhow::anyhow!("Unknown token storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth_base_url: String,
    pub expense_base_url: String,
    pub user_id: Option<String>,
    pub last_username: Option<String>,
    pub token_storage: TokenStorage,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            expense_base_url: DEFAULT_EXPENSE_BASE_URL.to_string(),
            user_id: None,
            last_username: None,
            token_storage: TokenStorage::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load from disk (defaults if absent) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in practice).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_AUTH_URL).filter(|v| !v.is_empty()) {
            self.auth_base_url = url;
        }
        if let Some(url) = lookup(ENV_EXPENSE_URL).filter(|v| !v.is_empty()) {
            self.expense_base_url = url;
        }
        if let Some(id) = lookup(ENV_USER_ID).filter(|v| !v.is_empty()) {
            self.user_id = Some(id);
        }
        if let Some(backend) = lookup(ENV_TOKEN_STORAGE) {
            match backend.parse() {
                Ok(storage) => self.token_storage = storage,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_TOKEN_STORAGE),
            }
        }
    }

    /// The id sent as `user_id` to the expense service.
    /// Falls back to the last username used to log in.
    pub fn expense_user_id(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .or(self.last_username.as_deref())
            .filter(|id| !id.is_empty())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
