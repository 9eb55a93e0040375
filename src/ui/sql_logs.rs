//! SQL logs view rendering.
//!
//! Connection usage for SQL executed outside managed transactions.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_millis;

use super::common::page_footer;
use super::sql::highlight;
use super::transactions::{filter_info, sort_label};

const TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Render the SQL Logs view: the table, a preview of the selected
/// row's queries and the page footer.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Min(4),
        Constraint::Length(6),
        Constraint::Length(1),
    ])
    .split(area);

    let logs = app.data.sql_log_rows();
    let sort = app.sql_query.sort.as_ref();
    let threshold = app.data.threshold.connection;

    let header = Row::new(vec![
        Cell::from(sort_label("Acquired", "conAcquiredTime", sort)),
        Cell::from("Released"),
        Cell::from(sort_label("Occupied", "conOccupiedTime", sort)),
        Cell::from(sort_label("Thread", "thread", sort)),
        Cell::from("Queries"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = logs
        .iter()
        .map(|log| {
            Row::new(vec![
                Cell::from(log.con_acquired_time.format(TIME_FORMAT).to_string()),
                Cell::from(log.con_release_time.format(TIME_FORMAT).to_string()),
                Cell::from(format_millis(log.con_occupied_time as f64))
                    .style(app.theme.alarm(log.con_occupied_time > threshold)),
                Cell::from(log.thread.clone().unwrap_or_else(|| "N/A".to_string())),
                Cell::from(log.executed_quires.len().to_string()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Fill(2),
        Constraint::Length(8),
    ];

    let selected = app.selected_sql_index.min(logs.len().saturating_sub(1));
    let position_info = if logs.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", selected + 1, logs.len())
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(" SQL Logs{}{} ", filter_info(app), position_info))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !logs.is_empty() {
        state.select(Some(selected));
    }
    frame.render_stateful_widget(table, chunks[0], &mut state);

    // Queries of the selected row
    let preview: Vec<Line> = logs
        .get(selected)
        .map(|log| {
            log.executed_quires
                .iter()
                .flat_map(|sql| highlight(sql, &app.theme))
                .collect()
        })
        .unwrap_or_default();
    let preview = Paragraph::new(preview).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(" Queries ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(preview, chunks[1]);

    let footer = match app.data.sql_logs {
        Some(ref page) if page.total_elements > 0 => page_footer(app, page),
        Some(_) => Line::from(Span::styled(
            " No SQL logs match",
            Style::default().add_modifier(Modifier::DIM),
        )),
        None => Line::from(Span::styled(
            " Waiting for SQL logs...",
            Style::default().add_modifier(Modifier::DIM),
        )),
    };
    frame.render_widget(Paragraph::new(footer), chunks[2]);
}
