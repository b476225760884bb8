//! Spendtrack TUI - a terminal front end for the expense tracker.
//!
//! Restores the session from the token store on startup, then shows the
//! login and signup forms or the dashboard and spends views depending on
//! whether the session is authenticated.

mod app;
mod cli;
mod ui;
mod utils;

use std::io;
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spendtrack_core::{open_token_store, ApiClient, Config, SessionManager};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_NAME: &str = "spendtrack.log";

/// Log to stderr; used by the one-shot CLI commands
fn init_stderr_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Log to a file in the cache directory so output never draws over the UI.
/// The returned guard flushes pending lines when dropped.
fn init_file_tracing(config: &Config) -> Result<WorkerGuard> {
    let log_dir = config.cache_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

fn build_session(config: &Config) -> Result<SessionManager> {
    let api = ApiClient::new(config)?;
    let store = open_token_store(config)?;
    Ok(SessionManager::new(api, store))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load config ({}), using defaults", e);
        Config::default()
    });

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    let first_arg = args.get(1).map(String::as_str);
    if let Some(command) = first_arg.filter(|arg| !arg.starts_with('/')) {
        init_stderr_tracing();
        let session = build_session(&config)?;
        return match command {
            "--status" => cli::status(&session, &config).await,
            "--login" => cli::login(&session, &mut config).await,
            "--logout" => cli::logout(&session),
            other => bail!(
                "Unknown argument: {} (expected --status, --login, --logout or a path like /spends)",
                other
            ),
        };
    }

    // Initialize logging
    let _log_guard = init_file_tracing(&config)?;
    info!("Spendtrack starting");

    let session = build_session(&config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, session);
    app.requested_route = cli::start_route(first_arg);
    app.start_bootstrap();

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = app.save_config() {
        warn!(error = %e, "Failed to save config");
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Spendtrack shutting down");
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
