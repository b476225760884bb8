use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::utils::{format_totals, truncate};

/// Rows shown in the recent spends panel
const RECENT_LIMIT: usize = 8;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if super::render_placeholder(frame, app, area, "Dashboard") {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Summary
            Constraint::Min(5),    // Recent spends
        ])
        .split(area);

    render_summary(frame, app, chunks[0]);
    render_recent(frame, app, chunks[1]);
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary = &app.summary;
    let latest = summary
        .latest
        .map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(vec![
            Span::styled("  Expenses:  ", styles::muted_style()),
            Span::styled(summary.count.to_string(), styles::list_item_style()),
        ]),
        Line::from(vec![
            Span::styled("  Total:     ", styles::muted_style()),
            Span::styled(format_totals(&summary.totals), styles::amount_style()),
        ]),
        Line::from(vec![
            Span::styled("  Latest:    ", styles::muted_style()),
            Span::styled(latest, styles::list_item_style()),
        ]),
    ];

    let block = Block::default()
        .title(" Summary ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_recent(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = app
        .sorted_expenses()
        .into_iter()
        .take(RECENT_LIMIT)
        .map(|expense| {
            Line::from(vec![
                Span::styled(format!("  {:<14}", expense.display_date()), styles::muted_style()),
                Span::styled(format!("{:<28}", truncate(&expense.merchant, 26)), styles::list_item_style()),
                Span::styled(expense.display_amount(), styles::amount_style()),
            ])
        })
        .collect();

    if lines.is_empty() {
        lines.push(Line::from(Span::styled("  No expenses yet", styles::muted_style())));
    }

    let block = Block::default()
        .title(" Recent ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
