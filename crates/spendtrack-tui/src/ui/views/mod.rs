//! Protected views, rendered only for an authenticated session.

pub mod dashboard;
pub mod spends;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

/// Render the loading or error placeholder, returning false when there is data to show
fn render_placeholder(frame: &mut Frame, app: &App, area: Rect, title: &str) -> bool {
    let message = if let Some(ref error) = app.expenses_error {
        Some(Span::styled(format!(" {}", error), styles::error_style()))
    } else if app.expenses_loading && app.expenses.is_empty() {
        Some(Span::styled(" Loading expenses...", styles::muted_style()))
    } else {
        None
    };

    let Some(message) = message else {
        return false;
    };

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(Line::from(message)).block(block), area);
    true
}
