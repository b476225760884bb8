use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Credentials for `POST /auth/v1/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration payload for `POST /auth/v1/signup`.
#[derive(Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: u64,
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub token: &'a str,
}

/// Token payload shared by login, signup and refresh.
/// `token` is the refresh token.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(rename = "accessToken")]
    pub access_token: Option<String>,
    pub token: Option<String>,
}

impl TokenResponse {
    /// Both tokens must be present and non-empty; a half pair is rejected.
    pub fn into_pair(self) -> Result<TokenPair, ApiError> {
        match (self.access_token, self.token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Ok(TokenPair::new(access, refresh))
            }
            _ => Err(ApiError::InvalidResponse(
                "Invalid response from server".to_string(),
            )),
        }
    }
}

/// An access token together with the refresh token issued alongside it.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}
