//! Application state management for Spendtrack.
//!
//! This module contains the core `App` struct that holds the view state
//! (forms, expense list, current route) and coordinates background tasks.
//! The session itself is owned by `SessionManager`; the app only reads
//! snapshots and calls its methods.

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use spendtrack_core::api::ErrorKind;
use spendtrack_core::routes::resolve;
use spendtrack_core::{
    ApiError, AuthState, AuthorizedClient, Config, ExpenseRecord, ExpenseSummary, LoginRequest,
    Route, SessionManager, SessionSnapshot, SignupRequest, TokenPair,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for the remaining signup fields.
const MAX_FIELD_LENGTH: usize = 100;

/// Maximum digits accepted for a phone number (fits in u64).
const MAX_PHONE_DIGITS: usize = 15;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Enums
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
    SignupLink,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::SignupLink,
            LoginFocus::SignupLink => LoginFocus::Username,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Username => LoginFocus::SignupLink,
            LoginFocus::Password => LoginFocus::Username,
            LoginFocus::Button => LoginFocus::Password,
            LoginFocus::SignupLink => LoginFocus::Button,
        }
    }
}

/// Signup form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupFocus {
    Username,
    Email,
    Password,
    FirstName,
    LastName,
    Phone,
    Button,
    LoginLink,
}

impl SignupFocus {
    const ORDER: [SignupFocus; 8] = [
        SignupFocus::Username,
        SignupFocus::Email,
        SignupFocus::Password,
        SignupFocus::FirstName,
        SignupFocus::LastName,
        SignupFocus::Phone,
        SignupFocus::Button,
        SignupFocus::LoginLink,
    ];

    fn index(&self) -> usize {
        Self::ORDER.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignupFocus::Username => "Username",
            SignupFocus::Email => "Email",
            SignupFocus::Password => "Password",
            SignupFocus::FirstName => "First name",
            SignupFocus::LastName => "Last name",
            SignupFocus::Phone => "Phone",
            SignupFocus::Button => "Sign Up",
            SignupFocus::LoginLink => "Log in instead",
        }
    }
}

// ============================================================================
// Forms
// ============================================================================

#[derive(Debug)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub focus: LoginFocus,
    pub error: Option<String>,
    pub submitting: bool,
}

impl LoginForm {
    fn new(username: String) -> Self {
        let focus = if username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        Self {
            username,
            password: String::new(),
            focus,
            error: None,
            submitting: false,
        }
    }

    /// Build the request, or explain which field is missing
    pub fn validate(&self) -> Result<LoginRequest, String> {
        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            return Err("Username and password required".to_string());
        }
        Ok(LoginRequest::new(username, self.password.clone()))
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            LoginFocus::Username => {
                if can_add_username_char(self.username.len(), c) {
                    self.username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(self.password.len(), c) {
                    self.password.push(c);
                }
            }
            LoginFocus::Button | LoginFocus::SignupLink => {}
        }
    }

    pub fn pop_char(&mut self) {
        match self.focus {
            LoginFocus::Username => {
                self.username.pop();
            }
            LoginFocus::Password => {
                self.password.pop();
            }
            LoginFocus::Button | LoginFocus::SignupLink => {}
        }
    }
}

#[derive(Debug)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub focus: SignupFocus,
    pub error: Option<String>,
    pub submitting: bool,
}

impl Default for SignupForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            password: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            focus: SignupFocus::Username,
            error: None,
            submitting: false,
        }
    }
}

impl SignupForm {
    pub fn field(&self, focus: SignupFocus) -> &str {
        match focus {
            SignupFocus::Username => &self.username,
            SignupFocus::Email => &self.email,
            SignupFocus::Password => &self.password,
            SignupFocus::FirstName => &self.first_name,
            SignupFocus::LastName => &self.last_name,
            SignupFocus::Phone => &self.phone,
            SignupFocus::Button | SignupFocus::LoginLink => "",
        }
    }

    fn field_mut(&mut self, focus: SignupFocus) -> Option<&mut String> {
        match focus {
            SignupFocus::Username => Some(&mut self.username),
            SignupFocus::Email => Some(&mut self.email),
            SignupFocus::Password => Some(&mut self.password),
            SignupFocus::FirstName => Some(&mut self.first_name),
            SignupFocus::LastName => Some(&mut self.last_name),
            SignupFocus::Phone => Some(&mut self.phone),
            SignupFocus::Button | SignupFocus::LoginLink => None,
        }
    }

    pub fn push_char(&mut self, c: char) {
        let focus = self.focus;
        let Some(field) = self.field_mut(focus) else {
            return;
        };
        let accepted = match focus {
            SignupFocus::Username => can_add_username_char(field.len(), c),
            SignupFocus::Password => can_add_password_char(field.len(), c),
            SignupFocus::Phone => field.len() < MAX_PHONE_DIGITS && c.is_ascii_digit(),
            _ => can_add_field_char(field.len(), c),
        };
        if accepted {
            field.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        let focus = self.focus;
        if let Some(field) = self.field_mut(focus) {
            field.pop();
        }
    }

    /// Build the request, or explain the first problem found
    pub fn validate(&self) -> Result<SignupRequest, String> {
        let required = [
            SignupFocus::Username,
            SignupFocus::Email,
            SignupFocus::Password,
            SignupFocus::FirstName,
            SignupFocus::LastName,
            SignupFocus::Phone,
        ];
        if let Some(missing) = required.iter().find(|f| self.field(**f).trim().is_empty()) {
            return Err(format!("{} is required", missing.label()));
        }
        if !self.email.contains('@') {
            return Err("Email address is not valid".to_string());
        }
        let phone_number: u64 = self
            .phone
            .parse()
            .map_err(|_| "Phone must contain digits only".to_string())?;

        Ok(SignupRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone_number,
        })
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from spawned network tasks back to the UI loop.
#[derive(Debug)]
pub enum TaskResult {
    /// The startup session check settled
    Bootstrapped(AuthState),
    /// Login request finished (username, tokens)
    LoggedIn(String, Result<TokenPair, ApiError>),
    /// Signup request finished (username, tokens)
    SignedUp(String, Result<TokenPair, ApiError>),
    /// Expense list fetched for the dashboard views
    Expenses(Result<Vec<ExpenseRecord>, ApiError>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: SessionManager,
    pub client: AuthorizedClient,

    pub state: AppState,
    /// Where the user asked to go; the guard decides what actually renders
    pub requested_route: Route,
    /// Last route that rendered, used to detect navigations
    current_view: Option<Route>,

    pub login: LoginForm,
    pub signup: SignupForm,

    // Expense data, refetched on every navigation into a protected view
    pub expenses: Vec<ExpenseRecord>,
    pub summary: ExpenseSummary,
    pub expenses_loading: bool,
    pub expenses_error: Option<String>,
    pub expense_selection: usize,

    pub status_message: Option<String>,

    session_rx: watch::Receiver<SessionSnapshot>,
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
}

impl App {
    pub fn new(config: Config, session: SessionManager) -> Self {
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let session_rx = session.subscribe();
        let client = AuthorizedClient::new(session.clone());
        let login = LoginForm::new(config.last_username.clone().unwrap_or_default());

        Self {
            config,
            session,
            client,
            state: AppState::Normal,
            requested_route: Route::LANDING,
            current_view: None,
            login,
            signup: SignupForm::default(),
            expenses: Vec::new(),
            summary: ExpenseSummary::default(),
            expenses_loading: false,
            expenses_error: None,
            expense_selection: 0,
            status_message: None,
            session_rx,
            task_rx,
            task_tx,
        }
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// The view to render now; `None` while the session is still resolving
    pub fn current_route(&self) -> Option<Route> {
        resolve(self.requested_route, &self.session.snapshot())
    }

    pub fn navigate(&mut self, route: Route) {
        debug!(path = route.path(), "Navigating");
        self.requested_route = route;
        self.sync_route();
    }

    /// Re-run the guard and react when the rendered view changes
    pub fn sync_route(&mut self) {
        let resolved = self.current_route();
        if resolved == self.current_view {
            return;
        }
        debug!(from = ?self.current_view, to = ?resolved, "View changed");
        self.current_view = resolved;

        match resolved {
            Some(Route::Dashboard) | Some(Route::Spends) => self.fetch_expenses(),
            Some(Route::Login) => {
                self.login.password.clear();
                self.login.submitting = false;
            }
            Some(Route::Signup) | None => {}
        }
    }

    // =========================================================================
    // Expense List
    // =========================================================================

    /// Expenses newest first, the order both views display
    pub fn sorted_expenses(&self) -> Vec<&ExpenseRecord> {
        let mut sorted: Vec<&ExpenseRecord> = self.expenses.iter().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sorted
    }

    /// Move the spends selection, clamped to the list bounds
    pub fn move_expense_selection(&mut self, delta: isize) {
        let last = self.expenses.len().saturating_sub(1);
        self.expense_selection = self
            .expense_selection
            .saturating_add_signed(delta)
            .min(last);
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Helper to send task results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send task result - channel closed");
        }
    }

    /// Spawn the one-time session check
    pub fn start_bootstrap(&self) {
        let session = self.session.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let state = session.bootstrap().await;
            Self::send_result(&tx, TaskResult::Bootstrapped(state)).await;
        });
    }

    pub fn submit_login(&mut self) {
        if self.login.submitting {
            return;
        }
        let request = match self.login.validate() {
            Ok(request) => request,
            Err(message) => {
                self.login.error = Some(message);
                return;
            }
        };

        self.login.error = None;
        self.login.submitting = true;

        let api = self.session.api().clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = api.login(&request).await;
            Self::send_result(&tx, TaskResult::LoggedIn(request.username, result)).await;
        });
    }

    pub fn submit_signup(&mut self) {
        if self.signup.submitting {
            return;
        }
        let request = match self.signup.validate() {
            Ok(request) => request,
            Err(message) => {
                self.signup.error = Some(message);
                return;
            }
        };

        self.signup.error = None;
        self.signup.submitting = true;

        let api = self.session.api().clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = api.signup(&request).await;
            Self::send_result(&tx, TaskResult::SignedUp(request.username, result)).await;
        });
    }

    /// Fetch the expense list fresh; nothing is cached across navigations
    pub fn fetch_expenses(&mut self) {
        let Some(user_id) = self.config.expense_user_id().map(str::to_string) else {
            warn!("No user id configured for expense lookup");
            self.expenses.clear();
            self.summary = ExpenseSummary::default();
            self.expenses_error = Some("No user ID found. Set SPENDTRACK_USER_ID.".to_string());
            return;
        };

        self.expenses_loading = true;
        self.expenses_error = None;

        let client = self.client.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_expenses(&user_id).await;
            Self::send_result(&tx, TaskResult::Expenses(result)).await;
        });
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.expenses.clear();
        self.summary = ExpenseSummary::default();
        self.status_message = Some("Logged out".to_string());
        self.navigate(Route::Login);
    }

    /// Drain finished tasks and pick up session transitions
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.process_task_result(result);
        }

        if self.session_rx.has_changed().unwrap_or(false) {
            let _ = self.session_rx.borrow_and_update();
            self.sync_route();
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Bootstrapped(state) => {
                info!(?state, "Session resolved");
                self.sync_route();
            }
            TaskResult::LoggedIn(username, result) => {
                self.login.submitting = false;
                match result {
                    Ok(tokens) => self.complete_authentication(username, tokens),
                    Err(e) => {
                        error!(error = %e, "Login failed");
                        self.login.error = Some(user_error_message(&e, AuthAction::Login));
                    }
                }
            }
            TaskResult::SignedUp(username, result) => {
                self.signup.submitting = false;
                match result {
                    Ok(tokens) => {
                        self.signup = SignupForm::default();
                        self.complete_authentication(username, tokens);
                    }
                    Err(e) => {
                        error!(error = %e, "Sign up failed");
                        self.signup.error = Some(user_error_message(&e, AuthAction::Signup));
                    }
                }
            }
            TaskResult::Expenses(result) => {
                self.expenses_loading = false;
                match result {
                    Ok(expenses) => {
                        self.summary = ExpenseSummary::from_records(&expenses);
                        self.expenses = expenses;
                        self.expense_selection = self
                            .expense_selection
                            .min(self.expenses.len().saturating_sub(1));
                        self.expenses_error = None;
                    }
                    Err(e) if e.kind() == ErrorKind::Auth => {
                        warn!(error = %e, "Session no longer valid, returning to login");
                        self.session.logout();
                        self.login.error = Some("Session expired. Please log in again.".to_string());
                        self.navigate(Route::Login);
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to fetch expenses");
                        self.expenses_error = Some(e.to_string());
                    }
                }
            }
        }
    }

    fn complete_authentication(&mut self, username: String, tokens: TokenPair) {
        self.session.login(tokens);
        self.config.last_username = Some(username);
        self.login.password.clear();
        self.login.error = None;
        self.status_message = None;
        info!("Authentication successful");
        self.navigate(Route::Dashboard);
    }

    /// Persist config changes (last username) on shutdown
    pub fn save_config(&self) -> Result<()> {
        self.config.save()
    }
}

// ============================================================================
// User-facing messages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Signup,
}

/// Map an API failure to the message shown under a form
pub fn user_error_message(err: &ApiError, action: AuthAction) -> String {
    if let Some(message) = err.server_message() {
        return message.to_string();
    }
    match err {
        ApiError::InvalidResponse(_) => "Invalid response from server".to_string(),
        ApiError::Unauthorized if action == AuthAction::Login => {
            "Invalid username or password".to_string()
        }
        ApiError::NetworkError(e) if e.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        ApiError::NetworkError(_) => {
            "Unable to connect to server. Check your internet connection.".to_string()
        }
        _ => match action {
            AuthAction::Login => "Login failed".to_string(),
            AuthAction::Signup => "Sign up failed".to_string(),
        },
    }
}

// ============================================================================
// Input Validation
// ============================================================================

/// Check if a character is valid for text input (printable, non-control)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
