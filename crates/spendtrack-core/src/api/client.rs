//! HTTP client for the auth and expense services.
//!
//! `ApiClient` knows the endpoints and the wire format but holds no
//! credentials: callers pass a bearer token per request. Token lifecycle
//! and the refresh-on-401 cycle live in `SessionManager` and
//! `AuthorizedClient`.

use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::models::{LoginRequest, RefreshRequest, SignupRequest, TokenPair, TokenResponse};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

pub const LOGIN_PATH: &str = "/auth/v1/login";
pub const SIGNUP_PATH: &str = "/auth/v1/signup";
pub const REFRESH_PATH: &str = "/auth/v1/refreshToken";
pub const PING_PATH: &str = "/auth/v1/ping";
pub const EXPENSES_PATH: &str = "/expense/v1/getExpense";

/// A single call description: where, what, and whether it needs a bearer token.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub requires_auth: bool,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: None,
            requires_auth: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, url).body(body)
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Mark the call as needing the session's bearer token
    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }
}

/// API client for the auth and expense services.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    auth_base_url: String,
    expense_base_url: String,
}

impl ApiClient {
    /// Create a client for the services named in the configuration
    pub fn new(config: &Config) -> Result<Self> {
        Self::build(
            &config.auth_base_url,
            &config.expense_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Create a client for explicit base URLs with the default timeout
    pub fn with_base_urls(auth_base_url: &str, expense_base_url: &str) -> Result<Self> {
        let defaults = Config::default();
        Self::build(
            auth_base_url,
            expense_base_url,
            Duration::from_secs(defaults.request_timeout_secs),
        )
    }

    fn build(auth_base_url: &str, expense_base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(Self::default_headers())
            .build()?;

        Ok(Self {
            client,
            auth_base_url: auth_base_url.trim_end_matches('/').to_string(),
            expense_base_url: expense_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn default_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            "X-Requested-With",
            header::HeaderValue::from_static("XMLHttpRequest"),
        );
        headers
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}{}", self.auth_base_url, path)
    }

    pub fn expense_url(&self, path: &str) -> String {
        format!("{}{}", self.expense_base_url, path)
    }

    /// Validate that a string looks like a session id (UUID format).
    /// Session ids should be 36 characters with dashes: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
    pub(crate) fn is_valid_session_id(s: &str) -> bool {
        if s.len() != 36 {
            return false;
        }
        s.chars().enumerate().all(|(i, c)| {
            if i == 8 || i == 13 || i == 18 || i == 23 {
                c == '-'
            } else {
                c.is_ascii_hexdigit()
            }
        })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request once, attaching `bearer` when given. No retries.
    pub async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        debug!(method = %request.method, url = %request.url, authenticated = bearer.is_some(), "Sending request");
        let response = builder.send().await?;
        Self::check_response(response).await
    }

    /// Read a successful response body as JSON
    pub async fn parse_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let url = response.url().to_string();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn post_for_tokens<B: Serialize>(&self, path: &str, body: &B) -> Result<TokenPair, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode request: {}", e)))?;
        let request = ApiRequest::post(self.auth_url(path), body);
        let response = self.execute(&request, None).await?;
        if response.status() != StatusCode::OK {
            return Err(ApiError::InvalidResponse(format!(
                "Unexpected status {}",
                response.status()
            )));
        }
        let tokens: TokenResponse = Self::parse_json(response).await?;
        tokens.into_pair()
    }

    // ===== Auth Endpoints =====

    /// Exchange credentials for a token pair
    pub async fn login(&self, credentials: &LoginRequest) -> Result<TokenPair, ApiError> {
        self.post_for_tokens(LOGIN_PATH, credentials).await
    }

    /// Register a new account; the server answers with a token pair like login
    pub async fn signup(&self, registration: &SignupRequest) -> Result<TokenPair, ApiError> {
        self.post_for_tokens(SIGNUP_PATH, registration).await
    }

    /// Exchange a refresh token for a new pair
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        self.post_for_tokens(REFRESH_PATH, &RefreshRequest { token: refresh_token })
            .await
    }

    /// Ask the auth service whether `access_token` is still live.
    /// Ok(true) only for a 200 whose body is a session id.
    pub async fn ping(&self, access_token: &str) -> Result<bool, ApiError> {
        let request = ApiRequest::get(self.auth_url(PING_PATH));
        let response = self.execute(&request, Some(access_token)).await?;
        if response.status() != StatusCode::OK {
            return Ok(false);
        }
        let body = response.text().await?;
        // Some backends wrap the id in a JSON string
        let id = body.trim().trim_matches('"');
        Ok(Self::is_valid_session_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::with_base_urls(&server.uri(), &server.uri()).unwrap()
    }

    #[test]
    fn test_is_valid_session_id() {
        assert!(ApiClient::is_valid_session_id("0E65066C-AB20-4DA0-B3BF-79DFD0668049"));
        assert!(ApiClient::is_valid_session_id("22b210e3-d325-41be-b761-31e18bfe2c73"));

        assert!(!ApiClient::is_valid_session_id(""));
        assert!(!ApiClient::is_valid_session_id("not-a-uuid"));
        assert!(!ApiClient::is_valid_session_id("0E65066CAB204DA0B3BF79DFD0668049"));
        assert!(!ApiClient::is_valid_session_id("ZZZZZZZZ-ZZZZ-ZZZZ-ZZZZ-ZZZZZZZZZZZZ"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::with_base_urls("http://auth.test/", "http://exp.test").unwrap();
        assert_eq!(client.auth_url(LOGIN_PATH), "http://auth.test/auth/v1/login");
        assert_eq!(client.expense_url(EXPENSES_PATH), "http://exp.test/expense/v1/getExpense");
    }

    #[tokio::test]
    async fn test_login_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(header("X-Requested-With", "XMLHttpRequest"))
            .and(body_json(json!({"username": "alice", "password": "pw"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"accessToken": "a1", "token": "r1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let pair = client_for(&server)
            .login(&LoginRequest::new("alice", "pw"))
            .await
            .unwrap();
        assert_eq!(pair, TokenPair::new("a1", "r1"));
    }

    #[tokio::test]
    async fn test_login_missing_token_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "a1"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .login(&LoginRequest::new("alice", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(ref m) if m == "Invalid response from server"));
    }

    #[tokio::test]
    async fn test_login_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .login(&LoginRequest::new("alice", "wrong"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_refresh_sends_token_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(body_json(json!({"token": "r1"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"accessToken": "a2", "token": "r2"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let pair = client_for(&server).refresh_token("r1").await.unwrap();
        assert_eq!(pair, TokenPair::new("a2", "r2"));
    }

    #[tokio::test]
    async fn test_ping_accepts_plain_and_quoted_uuid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PING_PATH))
            .and(header("Authorization", "Bearer plain"))
            .respond_with(ResponseTemplate::new(200).set_body_string("22b210e3-d325-41be-b761-31e18bfe2c73"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PING_PATH))
            .and(header("Authorization", "Bearer quoted"))
            .respond_with(ResponseTemplate::new(200).set_body_string("\"22b210e3-d325-41be-b761-31e18bfe2c73\"\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(PING_PATH))
            .and(header("Authorization", "Bearer bogus"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not-a-uuid"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.ping("plain").await.unwrap());
        assert!(client.ping("quoted").await.unwrap());
        assert!(!client.ping("bogus").await.unwrap());
    }

    #[tokio::test]
    async fn test_server_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SIGNUP_PATH))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"message": "Username already exists"})),
            )
            .mount(&server)
            .await;

        let registration = SignupRequest {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "pw".into(),
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            phone_number: 5551234567,
        };
        let err = client_for(&server).signup(&registration).await.unwrap_err();
        assert_eq!(err.server_message(), Some("Username already exists"));
    }
}
