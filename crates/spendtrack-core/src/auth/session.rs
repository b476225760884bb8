//! Session manager: the single owner of the token pair.
//!
//! `SessionManager` is a cheap handle (an `Arc` inside) that views and the
//! API wrapper share. Only its methods mutate the session; everybody else
//! reads snapshots or subscribes to changes.
//!
//! Lifecycle:
//! - starts in `AuthState::Unknown` (loading)
//! - `bootstrap()` resolves it once to `Authenticated` or `Unauthenticated`
//! - afterwards only `login`, `logout` and `refresh_auth` move it
//!
//! Concurrent `refresh_auth` calls share one in-flight refresh: the first
//! caller parks a `Shared` future in `pending_refresh`, later callers await
//! that same future, and the slot is emptied once it settles.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;
use crate::models::TokenPair;

use super::store::{TokenKind, TokenStore};

/// Coarse authentication state derived from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum AuthState {
    /// Startup check still running
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Point-in-time copy of the session.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
    pub loading: bool,
}

impl SessionSnapshot {
    fn initial() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn state(&self) -> AuthState {
        if self.loading {
            AuthState::Unknown
        } else if self.is_authenticated {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Both tokens present or both absent
    pub fn is_consistent(&self) -> bool {
        self.access_token.is_some() == self.refresh_token.is_some()
    }
}

impl fmt::Debug for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |t: &Option<String>| t.as_ref().map(|_| "<redacted>");
        f.debug_struct("SessionSnapshot")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("is_authenticated", &self.is_authenticated)
            .field("loading", &self.loading)
            .finish()
    }
}

type PendingRefresh = Shared<BoxFuture<'static, bool>>;

struct SessionInner {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
    state: watch::Sender<SessionSnapshot>,
    pending_refresh: Mutex<Option<PendingRefresh>>,
    /// Bumped by every login and logout. A refresh only lands if the epoch it
    /// started under is still current; the lock is held while it lands.
    epoch: Mutex<u64>,
}

impl SessionInner {
    fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    fn lock_epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_epoch(&self) -> u64 {
        *self.lock_epoch()
    }

    fn persist(&self, tokens: &TokenPair) -> Result<()> {
        self.store.set(TokenKind::Access, &tokens.access_token)?;
        self.store.set(TokenKind::Refresh, &tokens.refresh_token)?;
        Ok(())
    }

    fn mark_authenticated(&self, tokens: TokenPair) {
        self.state.send_modify(|s| {
            s.access_token = Some(tokens.access_token);
            s.refresh_token = Some(tokens.refresh_token);
            s.is_authenticated = true;
            s.loading = false;
        });
    }

    /// Adopt a pair issued by a fresh login, superseding any refresh in flight
    fn adopt(&self, tokens: TokenPair) {
        let mut epoch = self.lock_epoch();
        *epoch += 1;
        if let Err(e) = self.persist(&tokens) {
            warn!(error = %e, "Failed to persist tokens, session will not survive restart");
        }
        self.mark_authenticated(tokens);
    }

    /// Drop both tokens from storage and memory. Never fails.
    fn clear(&self) {
        let mut epoch = self.lock_epoch();
        *epoch += 1;
        self.clear_locked();
    }

    /// Caller holds the epoch lock
    fn clear_locked(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored tokens");
        }
        self.state.send_modify(|s| {
            s.access_token = None;
            s.refresh_token = None;
            s.is_authenticated = false;
            s.loading = false;
        });
    }

    async fn perform_refresh(self: Arc<Self>, refresh_token: String, started: u64) -> bool {
        info!("Refreshing session tokens");
        let result = self.api.refresh_token(&refresh_token).await;

        let epoch = self.lock_epoch();
        if *epoch != started {
            // A login or logout happened while waiting; it wins
            debug!("Session changed during refresh, discarding result");
            return self.state.borrow().is_authenticated;
        }

        match result {
            Ok(tokens) => match self.persist(&tokens) {
                Ok(()) => {
                    self.mark_authenticated(tokens);
                    info!("Session refreshed");
                    true
                }
                Err(e) => {
                    error!(error = %e, "Failed to persist refreshed tokens");
                    self.clear_locked();
                    false
                }
            },
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Token refresh failed, logging out");
                self.clear_locked();
                false
            }
        }
    }
}

/// Shared handle to the session. Clone is cheap.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    pub fn new(api: ApiClient, store: Arc<dyn TokenStore>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::initial());
        Self {
            inner: Arc::new(SessionInner {
                api,
                store,
                state,
                pending_refresh: Mutex::new(None),
                epoch: Mutex::new(0),
            }),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot()
    }

    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.state.borrow().access_token.clone()
    }

    /// Receive every session transition; used by views to re-run the route guard
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Adopt a freshly issued token pair. The caller has already authenticated.
    pub fn login(&self, tokens: TokenPair) {
        self.inner.adopt(tokens);
        info!("Logged in");
    }

    pub fn logout(&self) {
        self.inner.clear();
        info!("Logged out");
    }

    /// Verify the current access token against the ping endpoint.
    /// Never clears tokens itself.
    pub async fn is_logged_in(&self) -> bool {
        let Some(token) = self.access_token() else {
            return false;
        };
        match self.inner.api.ping(&token).await {
            Ok(valid) => {
                debug!(valid, "Session ping answered");
                valid
            }
            Err(e) => {
                debug!(error = %e, "Session ping failed");
                false
            }
        }
    }

    /// Trade the refresh token for a new pair.
    ///
    /// Returns false without touching the network when no refresh token is
    /// held. Any other failure logs out, unless a login or logout landed
    /// while the request was out; then that change stands. Concurrent callers
    /// join the refresh already in flight instead of starting another one.
    pub async fn refresh_auth(&self) -> bool {
        let pending = {
            let mut slot = self
                .inner
                .pending_refresh
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(pending) => {
                    debug!("Joining refresh already in flight");
                    pending.clone()
                }
                None => {
                    // Epoch first: a login landing in between only discards this refresh
                    let started = self.inner.current_epoch();
                    let Some(refresh_token) = self.inner.snapshot().refresh_token else {
                        debug!("No refresh token held, skipping refresh");
                        return false;
                    };
                    let pending = self
                        .inner
                        .clone()
                        .perform_refresh(refresh_token, started)
                        .boxed()
                        .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        let refreshed = pending.clone().await;

        let mut slot = self
            .inner
            .pending_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&pending)) {
            *slot = None;
        }
        refreshed
    }

    /// Refresh after the server rejected `rejected_token`.
    ///
    /// If the session already moved on to a different access token (another
    /// caller refreshed meanwhile), report success without a second refresh.
    pub async fn refresh_after_rejection(&self, rejected_token: &str) -> bool {
        match self.access_token() {
            Some(current) if current != rejected_token => {
                debug!("Access token already replaced, skipping refresh");
                true
            }
            _ => self.refresh_auth().await,
        }
    }

    /// One-time startup check. Leaves the session Authenticated or
    /// Unauthenticated and `loading` false, whatever happens.
    pub async fn bootstrap(&self) -> AuthState {
        let authenticated = match self.run_bootstrap().await {
            Ok(authenticated) => authenticated,
            Err(e) => {
                error!(error = %e, "Session bootstrap failed, clearing tokens");
                self.inner.clear();
                false
            }
        };

        self.inner.state.send_modify(|s| s.loading = false);
        info!(authenticated, "Session bootstrap complete");
        self.state()
    }

    async fn run_bootstrap(&self) -> Result<bool> {
        let access = self.inner.store.get(TokenKind::Access)?;
        let refresh = self.inner.store.get(TokenKind::Refresh)?;

        match (access, refresh) {
            (None, None) => {
                debug!("No stored tokens");
                Ok(false)
            }
            (Some(_), None) => {
                warn!("Access token stored without refresh token, clearing");
                self.inner.clear();
                Ok(false)
            }
            (None, Some(refresh)) => {
                debug!("Only refresh token stored, refreshing");
                self.inner
                    .state
                    .send_modify(|s| s.refresh_token = Some(refresh));
                Ok(self.refresh_auth().await)
            }
            (Some(access), Some(refresh)) => {
                self.inner.state.send_modify(|s| {
                    s.access_token = Some(access);
                    s.refresh_token = Some(refresh);
                });
                if self.is_logged_in().await {
                    self.inner.state.send_modify(|s| s.is_authenticated = true);
                    Ok(true)
                } else {
                    debug!("Stored access token rejected, refreshing");
                    Ok(self.refresh_auth().await)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::{PING_PATH, REFRESH_PATH};
    use crate::auth::MemoryTokenStore;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SESSION_ID: &str = "22b210e3-d325-41be-b761-31e18bfe2c73";

    fn manager(server: &MockServer, store: Arc<MemoryTokenStore>) -> SessionManager {
        let api = ApiClient::with_base_urls(&server.uri(), &server.uri()).unwrap();
        SessionManager::new(api, store)
    }

    fn stored(store: &MemoryTokenStore, kind: TokenKind) -> Option<String> {
        store.get(kind).unwrap()
    }

    async fn mount_refresh(server: &MockServer, from: &str, access: &str, refresh: &str) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(body_json(json!({ "token": from })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "accessToken": access, "token": refresh })),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_starts_unknown() {
        let server = MockServer::start().await;
        let session = manager(&server, Arc::new(MemoryTokenStore::new()));
        assert_eq!(session.state(), AuthState::Unknown);
        assert!(session.snapshot().loading);
    }

    #[tokio::test]
    async fn test_login_persists_both_tokens() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::new());
        let session = manager(&server, store.clone());

        session.login(TokenPair::new("a1", "r1"));

        assert_eq!(session.state(), AuthState::Authenticated);
        assert_eq!(session.access_token().as_deref(), Some("a1"));
        assert_eq!(stored(&store, TokenKind::Access).as_deref(), Some("a1"));
        assert_eq!(stored(&store, TokenKind::Refresh).as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_logout_twice_is_idempotent() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::new());
        let session = manager(&server, store.clone());
        session.login(TokenPair::new("a1", "r1"));

        session.logout();
        let first = session.snapshot();
        session.logout();
        let second = session.snapshot();

        assert_eq!(first, second);
        assert_eq!(second.state(), AuthState::Unauthenticated);
        assert_eq!(second.access_token, None);
        assert_eq!(stored(&store, TokenKind::Access), None);
        assert_eq!(stored(&store, TokenKind::Refresh), None);
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_is_noop() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let session = manager(&server, Arc::new(MemoryTokenStore::new()));
        session.bootstrap().await;
        let before = session.snapshot();

        assert!(!session.refresh_auth().await);
        assert_eq!(session.snapshot(), before);
    }

    #[tokio::test]
    async fn test_refresh_success_replaces_pair() {
        let server = MockServer::start().await;
        mount_refresh(&server, "r1", "a2", "r2").await;

        let store = Arc::new(MemoryTokenStore::new());
        let session = manager(&server, store.clone());
        session.login(TokenPair::new("a1", "r1"));

        assert!(session.refresh_auth().await);
        assert_eq!(session.access_token().as_deref(), Some("a2"));
        assert_eq!(stored(&store, TokenKind::Refresh).as_deref(), Some("r2"));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_failure_logs_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::new());
        let session = manager(&server, store.clone());
        session.login(TokenPair::new("a1", "r1"));

        assert!(!session.refresh_auth().await);
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert_eq!(stored(&store, TokenKind::Access), None);
        assert_eq!(stored(&store, TokenKind::Refresh), None);
    }

    #[tokio::test]
    async fn test_refresh_missing_field_logs_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "a2" })))
            .mount(&server)
            .await;

        let session = manager(&server, Arc::new(MemoryTokenStore::new()));
        session.login(TokenPair::new("a1", "r1"));

        assert!(!session.refresh_auth().await);
        assert!(session.snapshot().is_consistent());
        assert_eq!(session.access_token(), None);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_hits_endpoint_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "accessToken": "a2", "token": "r2" }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = manager(&server, Arc::new(MemoryTokenStore::new()));
        session.login(TokenPair::new("a1", "r1"));

        let (first, second, third) = tokio::join!(
            session.refresh_auth(),
            session.refresh_auth(),
            session.refresh_auth()
        );
        assert!(first && second && third);
        assert_eq!(session.access_token().as_deref(), Some("a2"));

        // Slot is released once settled
        assert!(session.inner.pending_refresh.lock().unwrap().is_none());
    }

    async fn mount_slow_refresh(server: &MockServer, status: u16) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(json!({ "accessToken": "a2", "token": "r2" }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    fn spawn_refresh(session: &SessionManager) -> tokio::task::JoinHandle<bool> {
        let session = session.clone();
        tokio::spawn(async move { session.refresh_auth().await })
    }

    #[tokio::test]
    async fn test_logout_during_refresh_stays_logged_out() {
        let server = MockServer::start().await;
        mount_slow_refresh(&server, 200).await;

        let store = Arc::new(MemoryTokenStore::new());
        let session = manager(&server, store.clone());
        session.login(TokenPair::new("a1", "r1"));

        let refresh = spawn_refresh(&session);
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.logout();

        assert!(!refresh.await.unwrap());
        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert_eq!(session.access_token(), None);
        assert_eq!(stored(&store, TokenKind::Access), None);
        assert_eq!(stored(&store, TokenKind::Refresh), None);
    }

    #[tokio::test]
    async fn test_login_during_refresh_keeps_newer_pair() {
        let server = MockServer::start().await;
        mount_slow_refresh(&server, 200).await;

        let store = Arc::new(MemoryTokenStore::new());
        let session = manager(&server, store.clone());
        session.login(TokenPair::new("a1", "r1"));

        let refresh = spawn_refresh(&session);
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.login(TokenPair::new("a3", "r3"));

        assert!(refresh.await.unwrap());
        assert_eq!(session.access_token().as_deref(), Some("a3"));
        assert_eq!(stored(&store, TokenKind::Access).as_deref(), Some("a3"));
        assert_eq!(stored(&store, TokenKind::Refresh).as_deref(), Some("r3"));
    }

    #[tokio::test]
    async fn test_failed_refresh_does_not_clear_newer_login() {
        let server = MockServer::start().await;
        mount_slow_refresh(&server, 401).await;

        let store = Arc::new(MemoryTokenStore::new());
        let session = manager(&server, store.clone());
        session.login(TokenPair::new("a1", "r1"));

        let refresh = spawn_refresh(&session);
        tokio::time::sleep(Duration::from_millis(50)).await;
        session.login(TokenPair::new("a3", "r3"));

        assert!(refresh.await.unwrap());
        assert_eq!(session.state(), AuthState::Authenticated);
        assert_eq!(stored(&store, TokenKind::Refresh).as_deref(), Some("r3"));
    }

    #[tokio::test]
    async fn test_refresh_after_rejection_skips_when_already_replaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let session = manager(&server, Arc::new(MemoryTokenStore::new()));
        session.login(TokenPair::new("a2", "r2"));

        assert!(session.refresh_after_rejection("a1").await);
        assert_eq!(session.access_token().as_deref(), Some("a2"));
    }

    #[tokio::test]
    async fn test_is_logged_in_without_token_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PING_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(SESSION_ID))
            .expect(0)
            .mount(&server)
            .await;

        let session = manager(&server, Arc::new(MemoryTokenStore::new()));
        assert!(!session.is_logged_in().await);
    }

    #[tokio::test]
    async fn test_is_logged_in_network_failure_keeps_tokens() {
        // Once dropped the server no longer answers the ping
        let server = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::new());
        let session = manager(&server, store.clone());
        session.login(TokenPair::new("a1", "r1"));
        drop(server);

        assert!(!session.is_logged_in().await);
        assert_eq!(stored(&store, TokenKind::Access).as_deref(), Some("a1"));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_bootstrap_with_valid_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PING_PATH))
            .and(header("Authorization", "Bearer a1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SESSION_ID))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_tokens(Some("a1"), Some("r1")));
        let session = manager(&server, store);

        assert_eq!(session.bootstrap().await, AuthState::Authenticated);
        assert_eq!(session.access_token().as_deref(), Some("a1"));
        assert!(!session.snapshot().loading);
    }

    #[tokio::test]
    async fn test_bootstrap_invalid_ping_body_triggers_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PING_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not-a-uuid"))
            .expect(1)
            .mount(&server)
            .await;
        mount_refresh(&server, "r1", "a2", "r2").await;

        let store = Arc::new(MemoryTokenStore::with_tokens(Some("a1"), Some("r1")));
        let session = manager(&server, store.clone());

        assert_eq!(session.bootstrap().await, AuthState::Authenticated);
        assert_eq!(session.access_token().as_deref(), Some("a2"));
        assert_eq!(stored(&store, TokenKind::Refresh).as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_bootstrap_refresh_only_storage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PING_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(SESSION_ID))
            .expect(0)
            .mount(&server)
            .await;
        mount_refresh(&server, "r1", "a2", "r2").await;

        let store = Arc::new(MemoryTokenStore::with_tokens(None, Some("r1")));
        let session = manager(&server, store.clone());

        assert_eq!(session.bootstrap().await, AuthState::Authenticated);
        assert_eq!(stored(&store, TokenKind::Access).as_deref(), Some("a2"));
        assert_eq!(stored(&store, TokenKind::Refresh).as_deref(), Some("r2"));
        assert!(session.snapshot().is_consistent());
    }

    #[tokio::test]
    async fn test_bootstrap_access_only_storage_is_cleared() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::with_tokens(Some("a1"), None));
        let session = manager(&server, store.clone());

        assert_eq!(session.bootstrap().await, AuthState::Unauthenticated);
        assert_eq!(stored(&store, TokenKind::Access), None);
    }

    #[tokio::test]
    async fn test_bootstrap_empty_storage() {
        let server = MockServer::start().await;
        let session = manager(&server, Arc::new(MemoryTokenStore::new()));
        let mut changes = session.subscribe();

        assert_eq!(session.bootstrap().await, AuthState::Unauthenticated);
        assert!(changes.has_changed().unwrap());
        assert_eq!(changes.borrow_and_update().state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_bootstrap_failed_refresh_ends_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PING_PATH))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryTokenStore::with_tokens(Some("a1"), Some("r1")));
        let session = manager(&server, store.clone());

        assert_eq!(session.bootstrap().await, AuthState::Unauthenticated);
        assert_eq!(stored(&store, TokenKind::Refresh), None);
    }

    #[test]
    fn test_snapshot_debug_redacts_tokens() {
        let snapshot = SessionSnapshot {
            access_token: Some("secret-access".into()),
            refresh_token: Some("secret-refresh".into()),
            is_authenticated: true,
            loading: false,
        };
        let printed = format!("{:?}", snapshot);
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<redacted>"));
    }
}
