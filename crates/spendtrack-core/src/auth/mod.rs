//! Authentication module for managing the session and its token pair.
//!
//! This module provides:
//! - `TokenStore`: durable storage for the access/refresh tokens, with
//!   file, OS keychain and in-memory backends
//! - `SessionManager`: login, logout, refresh and the startup check
//!
//! Tokens are opaque strings; nothing here decodes them.

pub mod file_store;
pub mod keyring_store;
pub mod session;
pub mod store;

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::config::{Config, TokenStorage};

pub use file_store::FileTokenStore;
pub use keyring_store::KeyringTokenStore;
pub use session::{AuthState, SessionManager, SessionSnapshot};
pub use store::{MemoryTokenStore, TokenKind, TokenStore};

/// Open the token store backend selected in the configuration
pub fn open_token_store(config: &Config) -> Result<Arc<dyn TokenStore>> {
    debug!(backend = ?config.token_storage, "Opening token store");
    let store: Arc<dyn TokenStore> = match config.token_storage {
        TokenStorage::File => Arc::new(FileTokenStore::new(config.cache_dir()?)),
        TokenStorage::Keyring => Arc::new(KeyringTokenStore::new()),
        TokenStorage::Memory => Arc::new(MemoryTokenStore::new()),
    };
    Ok(store)
}
