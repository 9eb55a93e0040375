//! Detail overlay rendering.
//!
//! A tabbed modal for one transaction: overview, connection usage, the
//! reconstructed timing timeline, executed SQL, children and SQL run
//! after the transaction finished.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{App, DetailTab};
use crate::data::duration::format_millis;
use crate::data::model::{EventKind, TransactionLog};
use crate::data::{build_timeline, HealthStatus, SpanOutcome, TimelineEntry};

use super::sql::highlight;
use super::Theme;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 16;

const TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Render the transaction detail as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Skip rendering if terminal is too small for the overlay
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let Some(ref detail) = app.detail else {
        return;
    };
    let Some(tx) = app.data.transaction_at(&detail.path) else {
        return;
    };

    // Width: 95% of screen, clamped to [MIN_OVERLAY_WIDTH, 120]
    let overlay_width = (area.width * 95 / 100).clamp(MIN_OVERLAY_WIDTH, 120);
    // Height: 90% of screen, clamped to [MIN_OVERLAY_HEIGHT, 50]
    let overlay_height = (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 50);

    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .title(format!(" {} ", title(tx)))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Length(1), // Tabs
        Constraint::Length(1), // Spacer
        Constraint::Min(4),    // Tab content
        Constraint::Length(1), // Footer
    ])
    .split(inner);

    // ===== TABS =====
    let available = app.available_tabs();
    let titles: Vec<Line> = DetailTab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let label = format!(" {}:{} ", i + 1, tab.label());
            if available.contains(tab) {
                Line::from(label)
            } else {
                Line::from(Span::styled(label, Style::default().add_modifier(Modifier::DIM)))
            }
        })
        .collect();
    let selected = DetailTab::ALL.iter().position(|t| *t == detail.tab).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");
    frame.render_widget(tabs, chunks[0]);

    // ===== CONTENT =====
    let lines = match detail.tab {
        DetailTab::Overview => overview_lines(tx, &app.theme),
        DetailTab::Connection => connection_lines(tx, &app.theme),
        DetailTab::Timing => timing_lines(tx, app),
        DetailTab::Sql => sql_lines(&tx.executed_quires, "No SQL executed", &app.theme),
        DetailTab::Children => children_lines(tx, &app.theme),
        DetailTab::PostTxSql => sql_lines(
            &tx.post_transaction_quires,
            "No SQL executed after the transaction",
            &app.theme,
        ),
    };
    let content = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((detail.scroll, 0));
    frame.render_widget(content, chunks[2]);

    // ===== FOOTER =====
    let footer = Paragraph::new(" Tab/←→:switch tab  1-6:jump  ↑↓:scroll  Esc:close")
        .style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(footer, chunks[3]);
}

fn title(tx: &TransactionLog) -> String {
    match tx.display_id() {
        Some(id) => format!("{} {}", id, tx.method),
        None => tx.method.clone(),
    }
}

fn field<'a>(label: &'static str, value: impl Into<Span<'a>>) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {:<20}", label), Style::default().add_modifier(Modifier::DIM)),
        value.into(),
    ])
}

fn empty(text: &'static str) -> Vec<Line<'static>> {
    vec![Line::from(Span::styled(
        format!(" {}", text),
        Style::default().add_modifier(Modifier::DIM),
    ))]
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn overview_lines(tx: &TransactionLog, theme: &Theme) -> Vec<Line<'static>> {
    let health = HealthStatus::of(tx);
    vec![
        field(
            "Method",
            Span::styled(tx.method.clone(), Style::default().add_modifier(Modifier::BOLD)),
        ),
        field(
            "Status",
            Span::styled(
                format!("{} ({})", tx.status.label(), health.symbol()),
                Style::default().fg(theme.phase_color(tx.status)).add_modifier(Modifier::BOLD),
            ),
        ),
        field("Propagation", tx.propagation.as_str()),
        field("Isolation", tx.isolation.as_str()),
        field("Start", tx.start_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string()),
        field("End", tx.end_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string()),
        field(
            "Duration",
            Span::styled(format_millis(tx.duration as f64), theme.alarm(tx.alarming_transaction)),
        ),
        field("Thread", tx.thread_name().to_string()),
        field("Connection oriented", yes_no(tx.connection_oriented)),
        field(
            "Alarming",
            Span::styled(yes_no(tx.alarming_transaction), theme.alarm(tx.alarming_transaction)),
        ),
        Line::from(""),
        field("Transactions", tx.total_transaction_count().to_string()),
        field("Queries", tx.total_query_count().to_string()),
        field("Direct children", tx.children.len().to_string()),
    ]
}

fn connection_lines(tx: &TransactionLog, theme: &Theme) -> Vec<Line<'static>> {
    let alarming = tx.having_alarming_connection.unwrap_or(false);
    let Some(summary) = tx.connection_summary else {
        return empty("No connection usage recorded");
    };
    vec![
        field("Acquisitions", summary.acquisition_count.to_string()),
        field(
            "Alarming",
            Span::styled(
                summary.alarming_connection_count.to_string(),
                theme.alarm(summary.alarming_connection_count > 0),
            ),
        ),
        field(
            "Occupied time",
            Span::styled(format_millis(summary.occupied_time as f64), theme.alarm(alarming)),
        ),
        field("Alarming connection", Span::styled(yes_no(alarming), theme.alarm(alarming))),
    ]
}

/// One line per event: marker, time, details and a duration badge.
fn timing_lines(tx: &TransactionLog, app: &App) -> Vec<Line<'static>> {
    let timeline = build_timeline(&tx.events, &app.data.threshold);
    if timeline.is_empty() {
        return empty("No timing events available");
    }
    timeline.iter().map(|entry| timeline_line(entry, &app.theme)).collect()
}

fn timeline_line(entry: &TimelineEntry, theme: &Theme) -> Line<'static> {
    let (marker, color) = match entry.kind {
        EventKind::TransactionStart => ("▶", theme.highlight),
        EventKind::TransactionEnd => ("■", theme.highlight),
        EventKind::ConnectionAcquired => ("◆", theme.healthy),
        EventKind::ConnectionReleased => ("◇", theme.healthy),
        EventKind::Other => ("•", theme.border),
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", marker), Style::default().fg(color)),
        Span::styled(
            entry.timestamp.format(TIME_FORMAT).to_string(),
            Style::default().add_modifier(Modifier::DIM),
        ),
        Span::raw(format!("  {}", entry.details)),
    ];

    match entry.span {
        SpanOutcome::Closed(millis) => {
            let style = if entry.alarming {
                Style::default().fg(theme.warning).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.healthy)
            };
            spans.push(Span::styled(format!("  [{}]", format_millis(millis as f64)), style));
        }
        SpanOutcome::Unmatched => {
            spans.push(Span::styled(
                "  [unmatched]",
                Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
            ));
        }
        SpanOutcome::Opened | SpanOutcome::None => {}
    }
    Line::from(spans)
}

fn sql_lines(queries: &[String], none: &'static str, theme: &Theme) -> Vec<Line<'static>> {
    if queries.is_empty() {
        return empty(none);
    }
    let mut lines = Vec::new();
    for (i, sql) in queries.iter().enumerate() {
        lines.push(Line::from(Span::styled(
            format!(" #{}", i + 1),
            Style::default().add_modifier(Modifier::DIM),
        )));
        lines.extend(highlight(sql, theme));
        lines.push(Line::from(""));
    }
    lines
}

fn children_lines(tx: &TransactionLog, theme: &Theme) -> Vec<Line<'static>> {
    if tx.children.is_empty() {
        return empty("No child transactions");
    }
    let mut lines = Vec::new();
    push_children(&tx.children, 0, theme, &mut lines);
    lines
}

fn push_children(
    children: &[TransactionLog],
    depth: usize,
    theme: &Theme,
    lines: &mut Vec<Line<'static>>,
) {
    for child in children {
        lines.push(Line::from(vec![
            Span::raw(format!(" {}", "  ".repeat(depth))),
            Span::styled(
                format!("{:<12}", child.status.label()),
                Style::default().fg(theme.phase_color(child.status)),
            ),
            Span::styled(
                format!("{:>9} ", format_millis(child.duration as f64)),
                theme.alarm(child.alarming_transaction),
            ),
            Span::raw(format!("{} ", child.method)),
            Span::styled(
                format!("{} · {}", child.propagation.as_str(), child.isolation.as_str()),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]));
        push_children(&child.children, depth + 1, theme, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::AlarmingThreshold;

    fn tx(json: &str) -> TransactionLog {
        serde_json::from_str(json).unwrap()
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    const BASE: &str = r#"
        "method": "OrderService.place",
        "propagation": "REQUIRED",
        "isolation": "DEFAULT",
        "startTime": "2025-03-01T10:00:00Z",
        "endTime": "2025-03-01T10:00:00.090Z",
        "duration": 90,
        "status": "COMMITTED"
    "#;

    #[test]
    fn test_timing_badges() {
        let tx = tx(&format!(
            r#"{{ {BASE}, "events": [
                {{"type": "TRANSACTION_START", "timestamp": "2025-03-01T10:00:00Z", "details": "begin"}},
                {{"type": "CONNECTION_ACQUIRED", "timestamp": "2025-03-01T10:00:00.005Z"}},
                {{"type": "CONNECTION_RELEASED", "timestamp": "2025-03-01T10:00:00.040Z"}},
                {{"type": "TRANSACTION_END", "timestamp": "2025-03-01T10:00:00.090Z"}},
                {{"type": "TRANSACTION_END", "timestamp": "2025-03-01T10:00:00.095Z"}}
            ] }}"#
        ));
        let threshold = AlarmingThreshold {
            transaction: 50,
            connection: 1000,
        };
        let theme = Theme::dark();
        let lines: Vec<String> = build_timeline(&tx.events, &threshold)
            .iter()
            .map(|e| text(&timeline_line(e, &theme)))
            .collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("begin"));
        assert!(lines[2].ends_with("[35ms]"));
        assert!(lines[3].ends_with("[90ms]"));
        assert!(lines[4].ends_with("[unmatched]"));
    }

    #[test]
    fn test_empty_tabs_show_placeholders() {
        let tx = tx(&format!("{{ {BASE} }}"));
        let theme = Theme::dark();
        assert!(text(&children_lines(&tx, &theme)[0]).contains("No child transactions"));
        assert!(text(&connection_lines(&tx, &theme)[0]).contains("No connection usage"));
        assert!(text(&sql_lines(&tx.executed_quires, "None", &theme)[0]).contains("None"));
    }

    #[test]
    fn test_children_are_nested() {
        let child = format!(r#"{{ {BASE}, "child": [{{ {BASE} }}] }}"#);
        let tx = tx(&format!(r#"{{ {BASE}, "child": [{child}] }}"#));
        let lines = children_lines(&tx, &Theme::dark());
        assert_eq!(lines.len(), 2);
        assert!(text(&lines[1]).starts_with("   "));
    }
}
