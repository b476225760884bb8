//! Keyboard input handling for the TUI.
//!
//! Keys are dispatched on the route that is currently rendered, so a key
//! pressed while the guard redirects never reaches a view the user cannot see.

use crossterm::event::{KeyCode, KeyEvent};

use spendtrack_core::Route;

use crate::app::{App, AppState, LoginFocus, SignupFocus, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    if matches!(app.state, AppState::ConfirmingQuit) {
        return handle_quit_confirm(app, key);
    }

    match app.current_route() {
        None => {
            // Still resolving the session; only allow leaving
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                app.state = AppState::Quitting;
                return true;
            }
            false
        }
        Some(Route::Login) => handle_login_input(app, key),
        Some(Route::Signup) => handle_signup_input(app, key),
        Some(route @ (Route::Dashboard | Route::Spends)) => handle_protected_input(app, route, key),
    }
}

fn handle_quit_confirm(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.state = AppState::Quitting;
            true
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.state = AppState::Normal;
            false
        }
        _ => false,
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Down | KeyCode::Tab => app.login.focus = app.login.focus.next(),
        KeyCode::Up | KeyCode::BackTab => app.login.focus = app.login.focus.prev(),
        KeyCode::Enter => match app.login.focus {
            LoginFocus::Username => app.login.focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.submit_login(),
            LoginFocus::SignupLink => {
                app.login.error = None;
                app.navigate(Route::Signup);
            }
        },
        KeyCode::Backspace => app.login.pop_char(),
        KeyCode::Char(c) => app.login.push_char(c),
        _ => {}
    }
    false
}

fn handle_signup_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.signup.error = None;
            app.navigate(Route::Login);
        }
        KeyCode::Down | KeyCode::Tab => app.signup.focus = app.signup.focus.next(),
        KeyCode::Up | KeyCode::BackTab => app.signup.focus = app.signup.focus.prev(),
        KeyCode::Enter => match app.signup.focus {
            SignupFocus::Button => app.submit_signup(),
            SignupFocus::LoginLink => {
                app.signup.error = None;
                app.navigate(Route::Login);
            }
            // Enter on the last text field submits, like a browser form
            SignupFocus::Phone => app.submit_signup(),
            field => app.signup.focus = field.next(),
        },
        KeyCode::Backspace => app.signup.pop_char(),
        KeyCode::Char(c) => app.signup.push_char(c),
        _ => {}
    }
    false
}

fn handle_protected_input(app: &mut App, route: Route, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('1') => app.navigate(Route::Dashboard),
        KeyCode::Char('2') => app.navigate(Route::Spends),
        KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
            let next = if route == Route::Dashboard {
                Route::Spends
            } else {
                Route::Dashboard
            };
            app.navigate(next);
        }
        KeyCode::Char('r') => app.fetch_expenses(),
        KeyCode::Char('l') => app.logout(),
        KeyCode::Up | KeyCode::Char('k') if route == Route::Spends => {
            app.move_expense_selection(-1)
        }
        KeyCode::Down | KeyCode::Char('j') if route == Route::Spends => {
            app.move_expense_selection(1)
        }
        KeyCode::PageUp if route == Route::Spends => {
            app.move_expense_selection(-(PAGE_SCROLL_SIZE as isize))
        }
        KeyCode::PageDown if route == Route::Spends => {
            app.move_expense_selection(PAGE_SCROLL_SIZE as isize)
        }
        KeyCode::Home if route == Route::Spends => app.expense_selection = 0,
        KeyCode::End if route == Route::Spends => {
            app.expense_selection = app.expenses.len().saturating_sub(1)
        }
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use spendtrack_core::auth::MemoryTokenStore;
    use spendtrack_core::{ApiClient, Config, SessionManager, TokenPair};
    use std::sync::Arc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn app(tokens: Option<TokenPair>) -> App {
        // Nothing listens here; these tests never reach the network
        let api = ApiClient::with_base_urls("http://127.0.0.1:9", "http://127.0.0.1:9").unwrap();
        let session = SessionManager::new(api, Arc::new(MemoryTokenStore::new()));
        session.bootstrap().await;
        if let Some(tokens) = tokens {
            session.login(tokens);
        }
        let config = Config {
            user_id: None,
            last_username: None,
            ..Config::default()
        };
        App::new(config, session)
    }

    #[tokio::test]
    async fn test_login_typing_and_focus() {
        let mut app = app(None).await;
        app.navigate(Route::Login);

        for c in "bob".chars() {
            handle_input(&mut app, key(KeyCode::Char(c)));
        }
        handle_input(&mut app, key(KeyCode::Backspace));
        handle_input(&mut app, key(KeyCode::Tab));
        handle_input(&mut app, key(KeyCode::Char('x')));

        assert_eq!(app.login.username, "bo");
        assert_eq!(app.login.password, "x");
        assert_eq!(app.login.focus, LoginFocus::Password);
    }

    #[tokio::test]
    async fn test_signup_link_and_back() {
        let mut app = app(None).await;
        app.navigate(Route::Login);
        app.login.focus = LoginFocus::SignupLink;

        handle_input(&mut app, key(KeyCode::Enter));
        assert_eq!(app.current_route(), Some(Route::Signup));

        handle_input(&mut app, key(KeyCode::Esc));
        assert_eq!(app.current_route(), Some(Route::Login));
    }

    #[tokio::test]
    async fn test_esc_on_login_quits() {
        let mut app = app(None).await;
        app.navigate(Route::Login);
        assert!(handle_input(&mut app, key(KeyCode::Esc)));
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_protected_tabs_and_logout() {
        let mut app = app(Some(TokenPair::new("a1", "r1"))).await;
        app.navigate(Route::Dashboard);

        handle_input(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.current_route(), Some(Route::Spends));

        handle_input(&mut app, key(KeyCode::Char('l')));
        assert!(!app.session.is_authenticated());
        assert_eq!(app.current_route(), Some(Route::Login));
    }

    #[tokio::test]
    async fn test_quit_requires_confirmation() {
        let mut app = app(Some(TokenPair::new("a1", "r1"))).await;
        app.navigate(Route::Dashboard);

        assert!(!handle_input(&mut app, key(KeyCode::Char('q'))));
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(!handle_input(&mut app, key(KeyCode::Char('n'))));
        assert_eq!(app.state, AppState::Normal);

        handle_input(&mut app, key(KeyCode::Char('q')));
        assert!(handle_input(&mut app, key(KeyCode::Char('y'))));
    }
}
