use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::store::{TokenKind, TokenStore};

/// Token file name in cache directory
const TOKEN_FILE: &str = "tokens.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(rename = "accessToken", default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl StoredTokens {
    fn slot(&mut self, kind: TokenKind) -> &mut Option<String> {
        match kind {
            TokenKind::Access => &mut self.access_token,
            TokenKind::Refresh => &mut self.refresh_token,
        }
    }
}

/// Token pair persisted as JSON in the cache directory.
pub struct FileTokenStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(TOKEN_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoredTokens> {
        if !self.path.exists() {
            return Ok(StoredTokens::default());
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read token file")?;
        serde_json::from_str(&contents).context("Failed to parse token file")
    }

    fn save(&self, tokens: &StoredTokens) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(tokens)?;
        std::fs::write(&self.path, contents).context("Failed to write token file")?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, kind: TokenKind) -> Result<Option<String>> {
        let mut tokens = self.load()?;
        Ok(tokens.slot(kind).take())
    }

    fn set(&self, kind: TokenKind, value: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("token file lock poisoned"))?;
        let mut tokens = self.load()?;
        *tokens.slot(kind) = Some(value.to_string());
        self.save(&tokens)?;
        debug!(%kind, "Token persisted");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("token file lock poisoned"))?;
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove token file")?;
        }
        Ok(())
    }
}
