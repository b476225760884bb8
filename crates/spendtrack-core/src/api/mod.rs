//! REST API client module for the auth and expense services.
//!
//! This module provides:
//! - `ApiClient`: endpoint URLs, wire format and single-shot requests
//! - `AuthorizedClient`: bearer-authenticated requests that refresh the
//!   session once on a 401 and retry once
//! - `ApiError`: the failure taxonomy surfaced to views

pub mod authorized;
pub mod client;
pub mod error;

pub use authorized::AuthorizedClient;
pub use client::{ApiClient, ApiRequest};
pub use error::{ApiError, ErrorKind};
