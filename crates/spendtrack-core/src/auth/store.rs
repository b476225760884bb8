use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

/// Which half of the token pair a store entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub const ALL: [TokenKind; 2] = [TokenKind::Access, TokenKind::Refresh];

    /// Fixed storage key for this kind
    pub fn key(&self) -> &'static str {
        match self {
            TokenKind::Access => "accessToken",
            TokenKind::Refresh => "refreshToken",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Durable key-value storage for the token pair.
///
/// Values are opaque strings; implementations never inspect them.
pub trait TokenStore: Send + Sync {
    fn get(&self, kind: TokenKind) -> Result<Option<String>>;
    fn set(&self, kind: TokenKind, value: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<TokenKind, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
        let mut tokens = HashMap::new();
        if let Some(access) = access {
            tokens.insert(TokenKind::Access, access.to_string());
        }
        if let Some(refresh) = refresh {
            tokens.insert(TokenKind::Refresh, refresh.to_string());
        }
        Self {
            tokens: Mutex::new(tokens),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<TokenKind, String>>> {
        self.tokens
            .lock()
            .map_err(|_| anyhow!("token store lock poisoned"))
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, kind: TokenKind) -> Result<Option<String>> {
        Ok(self.lock()?.get(&kind).cloned())
    }

    fn set(&self, kind: TokenKind, value: &str) -> Result<()> {
        self.lock()?.insert(kind, value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}
