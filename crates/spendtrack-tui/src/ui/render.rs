use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use spendtrack_core::Route;

use crate::app::{App, AppState, LoginFocus, SignupFocus};

use super::styles;
use super::views::{dashboard, spends};

/// Visible width of a form input box
const FIELD_WIDTH: usize = 24;

const LOGO: [&str; 2] = ["   ┌─┐┌─┐┌─┐┌┐┌┌┬┐┌┬┐┬─┐┌─┐┌─┐┬┌─", "   └─┐├─┘├┤ │││ ││ │ ├┬┘├─┤│  ├┴┐"];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let route = app.current_route();

    render_title_bar(frame, route, chunks[0]);
    match route {
        None => render_waiting(frame, chunks[1]),
        Some(Route::Login) => render_login_form(frame, app, chunks[1]),
        Some(Route::Signup) => render_signup_form(frame, app, chunks[1]),
        Some(Route::Dashboard) => dashboard::render(frame, app, chunks[1]),
        Some(Route::Spends) => spends::render(frame, app, chunks[1]),
    }
    render_status_bar(frame, app, route, chunks[2]);

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, route: Option<Route>, area: Rect) {
    let mut spans = vec![Span::styled("  Spendtrack", styles::title_style())];

    // Tabs only make sense once the user is inside the protected area
    if matches!(route, Some(Route::Dashboard) | Some(Route::Spends)) {
        spans.push(Span::raw("    "));
        let tabs = [("[1] Dashboard", Route::Dashboard), ("[2] Spends", Route::Spends)];
        for (i, (label, tab)) in tabs.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", styles::muted_style()));
            }
            spans.push(Span::styled(*label, styles::tab_style(route == Some(*tab))));
        }
    } else if let Some(route) = route {
        spans.push(Span::styled(format!("  {}", route.title()), styles::muted_style()));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, route: Option<Route>, area: Rect) {
    let shortcuts = match route {
        None => "[q]uit",
        Some(Route::Login) => "[Tab] next field | [Enter] select | [Esc] quit",
        Some(Route::Signup) => "[Tab] next field | [Enter] select | [Esc] back to login",
        Some(Route::Dashboard) => "[r]eload | [l]ogout | [q]uit",
        Some(Route::Spends) => "[↑/↓] scroll | [r]eload | [l]ogout | [q]uit",
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => String::from(" "),
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

/// Neutral view shown while the startup session check runs
fn render_waiting(frame: &mut Frame, area: Rect) {
    let area = centered_rect_fixed(40, 3, area);
    let text = Paragraph::new(Line::from(Span::styled(
        "Checking session...",
        styles::muted_style(),
    )))
    .centered();
    frame.render_widget(text, area);
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|l| Line::from(Span::styled(*l, styles::title_style())))
        .collect()
}

/// One labelled input row, e.g. `Username: [alice▌           ]`
fn field_line(label: &str, value: &str, focused: bool, masked: bool) -> Line<'static> {
    let shown: String = if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    // Keep the tail visible when the value is longer than the box
    let skip = shown.chars().count().saturating_sub(FIELD_WIDTH - 1);
    let shown: String = shown.chars().skip(skip).collect();
    let cursor = if focused { "▌" } else { "" };
    let display = format!("{:<width$}", format!("{}{}", shown, cursor), width = FIELD_WIDTH);

    Line::from(vec![
        Span::styled(format!("  {:>11}: [", label), styles::muted_style()),
        Span::styled(display, styles::field_style(focused)),
        Span::styled("]", styles::muted_style()),
    ])
}

fn button_line(label: &str, focused: bool, busy: bool) -> Line<'static> {
    let text = if busy {
        format!("  {}...  ", label)
    } else if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    Line::from(vec![
        Span::raw("              ["),
        Span::styled(text, styles::field_style(focused)),
        Span::raw("]"),
    ])
}

fn link_line(label: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::highlight_style()
    };
    Line::from(vec![Span::raw("              "), Span::styled(label.to_string(), style)])
}

fn render_form(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'static>>) {
    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(46, height, area);

    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_login_form(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.login;
    let mut lines = logo_lines();
    lines.push(Line::from(""));

    lines.push(field_line(
        "Username",
        &form.username,
        form.focus == LoginFocus::Username,
        false,
    ));
    lines.push(field_line(
        "Password",
        &form.password,
        form.focus == LoginFocus::Password,
        true,
    ));
    lines.push(Line::from(""));
    lines.push(button_line("Login", form.focus == LoginFocus::Button, form.submitting));
    lines.push(link_line(
        "No account? Sign up",
        form.focus == LoginFocus::SignupLink,
    ));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    render_form(frame, area, "Login", lines);
}

fn render_signup_form(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.signup;
    let mut lines = logo_lines();
    lines.push(Line::from(""));

    for field in [
        SignupFocus::Username,
        SignupFocus::Email,
        SignupFocus::Password,
        SignupFocus::FirstName,
        SignupFocus::LastName,
        SignupFocus::Phone,
    ] {
        lines.push(field_line(
            field.label(),
            form.field(field),
            form.focus == field,
            field == SignupFocus::Password,
        ));
    }
    lines.push(Line::from(""));
    lines.push(button_line(
        SignupFocus::Button.label(),
        form.focus == SignupFocus::Button,
        form.submitting,
    ));
    lines.push(link_line(
        "Have an account? Log in",
        form.focus == SignupFocus::LoginLink,
    ));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    render_form(frame, area, "Sign Up", lines);
}

/// Create a centered rectangle with fixed dimensions
pub(crate) fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());

    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
