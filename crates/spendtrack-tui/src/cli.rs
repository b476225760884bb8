//! Non-interactive commands run instead of the terminal UI.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use tracing::warn;

use spendtrack_core::{resolve, AuthState, Config, LoginRequest, Route, SessionManager};

/// `--status`: run the startup check and report the result
pub async fn status(session: &SessionManager, config: &Config) -> Result<()> {
    for line in status_report(session, config).await {
        println!("{}", line);
    }
    Ok(())
}

async fn status_report(session: &SessionManager, config: &Config) -> Vec<String> {
    let mut lines = Vec::new();
    match session.bootstrap().await {
        AuthState::Authenticated => {
            lines.push("Logged in".to_string());
            if let Some(user) = config.expense_user_id() {
                lines.push(format!("User: {}", user));
            }
        }
        AuthState::Unauthenticated | AuthState::Unknown => lines.push("Not logged in".to_string()),
    }
    if let Some(route) = resolve(Route::LANDING, &session.snapshot()) {
        lines.push(format!("Opens at: {}", route.path()));
    }
    lines.push(format!("Auth service: {}", config.auth_base_url));
    lines.push(format!("Expense service: {}", config.expense_base_url));
    lines
}

/// View to open the terminal UI at, from an optional path argument like `/spends`
pub fn start_route(path: Option<&str>) -> Route {
    path.map(Route::from_path).unwrap_or(Route::LANDING)
}

/// `--login`: prompt for credentials and store the resulting tokens
pub async fn login(session: &SessionManager, config: &mut Config) -> Result<()> {
    println!("\n=== Spendtrack Login ===\n");

    let username = match config.last_username {
        Some(ref last_user) => {
            let input = prompt(&format!("Username [{}]: ", last_user))?;
            if input.is_empty() {
                last_user.clone()
            } else {
                input
            }
        }
        None => prompt("Username: ")?,
    };
    if username.is_empty() {
        bail!("Username required");
    }

    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        bail!("Password required");
    }

    println!("\nAuthenticating...");
    let tokens = session
        .api()
        .login(&LoginRequest::new(username.clone(), password))
        .await
        .context("Login failed")?;
    session.login(tokens);

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Login successful!\n");
    Ok(())
}

/// `--logout`: forget stored tokens
pub fn logout(session: &SessionManager) -> Result<()> {
    session.logout();
    println!("Logged out");
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
