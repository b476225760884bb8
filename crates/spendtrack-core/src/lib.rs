//! Spendtrack core - session management and API access for the expense
//! tracker.
//!
//! - `auth`: token stores and the `SessionManager`
//! - `api`: HTTP client, the refresh-and-retry wrapper and `ApiError`
//! - `routes`: route table and authentication gate
//! - `models`: wire types for auth and expenses
//! - `config`: persisted configuration with environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod routes;

pub use api::{ApiClient, ApiError, ApiRequest, AuthorizedClient, ErrorKind};
pub use auth::{open_token_store, AuthState, SessionManager, SessionSnapshot, TokenKind, TokenStore};
pub use config::Config;
pub use models::{ExpenseRecord, ExpenseSummary, LoginRequest, SignupRequest, TokenPair};
pub use routes::{guard, resolve, Guard, Route};
