use anyhow::{Context, Result};
use keyring::Entry;

use super::store::{TokenKind, TokenStore};

const SERVICE_NAME: &str = "spendtrack";

/// Token pair kept in the OS keychain, one entry per kind.
pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, kind: TokenKind) -> Result<Entry> {
        Entry::new(&self.service, kind.key()).context("Failed to create keyring entry")
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    /// Retrieve a token from the OS keychain
    fn get(&self, kind: TokenKind) -> Result<Option<String>> {
        match self.entry(kind)?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    /// Store a token in the OS keychain
    fn set(&self, kind: TokenKind, value: &str) -> Result<()> {
        self.entry(kind)?
            .set_password(value)
            .context("Failed to store token in keychain")
    }

    /// Delete both entries; missing entries are not an error
    fn clear(&self) -> Result<()> {
        for kind in TokenKind::ALL {
            match self.entry(kind)?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => return Err(e).context("Failed to delete token from keychain"),
            }
        }
        Ok(())
    }
}
