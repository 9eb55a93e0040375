//! Transactions view rendering.
//!
//! A paginated table of transaction logs. Rows with children carry an
//! expand marker; expanded children are indented under their parent.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_millis;
use crate::data::model::TransactionLog;
use crate::data::query::TransactionQuery;
use crate::data::{Direction, HealthStatus, Sort, TransactionRow};

use super::common::page_footer;

const TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Render the Transactions view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Min(4), Constraint::Length(1)]).split(area);

    let rows = app.transaction_rows();
    let header = Row::new(vec![
        Cell::from(header_label("Method", "method", &app.tx_query)),
        Cell::from(header_label("Start", "startTime", &app.tx_query)),
        Cell::from(header_label("Duration", "duration", &app.tx_query)),
        Cell::from(header_label("Status", "status", &app.tx_query)),
        Cell::from("Propagation"),
        Cell::from("Isolation"),
        Cell::from(header_label("Thread", "thread", &app.tx_query)),
        Cell::from("SQL"),
    ])
    .height(1)
    .style(app.theme.header);

    let table_rows: Vec<Row> = rows
        .iter()
        .filter_map(|row| Some(table_row(app, row, app.data.transaction_at(&row.path)?)))
        .collect();

    let widths = [
        Constraint::Fill(4),
        Constraint::Length(12),
        Constraint::Length(9),
        Constraint::Length(11),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(4),
    ];

    let selected = app.selected_tx_index.min(rows.len().saturating_sub(1));
    let position_info = if rows.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", selected + 1, rows.len())
    };

    let title = format!(
        " Transactions{}{}{} ",
        filter_info(app),
        active_filters(&app.tx_query),
        position_info
    );

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !rows.is_empty() {
        state.select(Some(selected));
    }
    frame.render_stateful_widget(table, chunks[0], &mut state);

    let footer = match app.data.transactions {
        Some(ref page) if page.total_elements > 0 => page_footer(app, page),
        Some(_) => Line::from(Span::styled(
            " No transactions match",
            Style::default().add_modifier(Modifier::DIM),
        )),
        None => Line::from(Span::styled(
            " Waiting for transactions...",
            Style::default().add_modifier(Modifier::DIM),
        )),
    };
    frame.render_widget(Paragraph::new(footer), chunks[1]);
}

fn table_row(app: &App, row: &TransactionRow, tx: &TransactionLog) -> Row<'static> {
    let theme = &app.theme;
    let marker = match (row.has_children, row.expanded) {
        (true, true) => "▾ ",
        (true, false) => "▸ ",
        (false, _) => "  ",
    };
    let mut method = vec![Span::raw("  ".repeat(row.depth)), Span::raw(marker)];
    if let Some(id) = tx.display_id() {
        method.push(Span::styled(
            format!("{} ", id),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    method.push(Span::raw(tx.method.clone()));

    let mut status_style = Style::default().fg(theme.phase_color(tx.status));
    if HealthStatus::of(tx) == HealthStatus::Critical {
        status_style = status_style.add_modifier(Modifier::BOLD);
    }
    let status = Span::styled(tx.status.label(), status_style);

    Row::new(vec![
        Cell::from(Line::from(method)),
        Cell::from(tx.start_time.format(TIME_FORMAT).to_string()),
        Cell::from(format_millis(tx.duration as f64)).style(theme.alarm(tx.alarming_transaction)),
        Cell::from(status),
        Cell::from(tx.propagation.as_str()),
        Cell::from(tx.isolation.as_str()),
        Cell::from(tx.thread_name().to_string()),
        Cell::from(tx.executed_quires.len().to_string()),
    ])
}

/// Column label with a sort arrow when the query sorts by `property`.
pub fn header_label(name: &str, property: &str, query: &TransactionQuery) -> String {
    sort_label(name, property, query.sort.as_ref())
}

pub(super) fn sort_label(name: &str, property: &str, sort: Option<&Sort>) -> String {
    match sort {
        Some(sort) if sort.property == property => {
            let arrow = match sort.direction {
                Direction::Asc => "↑",
                Direction::Desc => "↓",
            };
            format!("{}{}", name, arrow)
        }
        _ => name.to_string(),
    }
}

/// Search text being typed, or the applied one.
pub(super) fn filter_info(app: &App) -> String {
    let applied = match app.current_view {
        View::SqlLogs => &app.sql_query.search,
        _ => &app.tx_query.search,
    };
    if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !applied.is_empty() {
        format!(" /{}/ [c:clear]", applied)
    } else {
        String::new()
    }
}

fn active_filters(query: &TransactionQuery) -> String {
    let mut parts = Vec::new();
    if let Some(status) = query.status {
        parts.push(status.as_str().to_string());
    }
    if let Some(propagation) = query.propagation {
        parts.push(propagation.as_str().to_string());
    }
    if let Some(isolation) = query.isolation {
        parts.push(isolation.as_str().to_string());
    }
    if let Some(connection) = query.connection_oriented {
        parts.push(if connection { "CONN" } else { "NO-CONN" }.to_string());
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" [{}]", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::TransactionPhaseStatus;

    #[test]
    fn test_header_label_marks_sorted_column() {
        let query = TransactionQuery::default();
        assert_eq!(header_label("Start", "startTime", &query), "Start↓");
        assert_eq!(header_label("Method", "method", &query), "Method");

        let query = TransactionQuery {
            sort: Some(Sort::new("method", Direction::Asc)),
            ..Default::default()
        };
        assert_eq!(header_label("Method", "method", &query), "Method↑");
    }

    #[test]
    fn test_active_filters_summary() {
        let query = TransactionQuery {
            status: Some(TransactionPhaseStatus::Errored),
            connection_oriented: Some(false),
            ..Default::default()
        };
        assert_eq!(active_filters(&query), " [ERRORED NO-CONN]");
        assert_eq!(active_filters(&TransactionQuery::default()), "");
    }
}
