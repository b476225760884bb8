//! Data models exchanged with the auth and expense services.
//!
//! - `LoginRequest`, `SignupRequest`: transient credentials, never persisted
//! - `TokenPair`: an access token plus its refresh token
//! - `ExpenseRecord`, `ExpenseSummary`: dashboard data

pub mod auth;
pub mod expense;

pub(crate) use auth::{RefreshRequest, TokenResponse};
pub use auth::{LoginRequest, SignupRequest, TokenPair};
pub use expense::{ExpenseRecord, ExpenseSummary};
