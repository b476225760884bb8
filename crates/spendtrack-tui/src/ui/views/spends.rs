use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if super::render_placeholder(frame, app, area, "Spends") {
        return;
    }

    let header = Row::new([
        Cell::from("Date"),
        Cell::from("Merchant"),
        Cell::from("Amount"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .sorted_expenses()
        .into_iter()
        .enumerate()
        .map(|(i, expense)| {
            let style = if i == app.expense_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(expense.display_date()),
                Cell::from(expense.merchant.as_str()),
                Cell::from(expense.display_amount()).style(styles::amount_style()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(16), // "Mar 01, 2024" + padding
        Constraint::Fill(1),    // Merchant
        Constraint::Length(18), // Amount + currency
    ];

    let title = if app.expenses_loading {
        format!(" Spends ({}) - refreshing ", app.expenses.len())
    } else {
        format!(" Spends ({}) ", app.expenses.len())
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.expenses.is_empty() {
        state.select(Some(app.expense_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
