//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, page footer
//! and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_millis;
use crate::data::model::PageResponse;
use crate::data::pagination::{page_window, record_range, PageItem};
use crate::data::history::History;
use crate::data::HealthStatus;
use crate::ui::Theme;

/// Sparkline characters (8 levels of height).
pub const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the header bar with the transaction summary.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref summary) = app.data.summary else {
        let line = Line::from(vec![
            Span::styled(" TX BOARD ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("| Loading..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let theme = &app.theme;
    let failed = summary.rolled_back_count + summary.errored_count;
    let status = if summary.errored_count > 0 {
        HealthStatus::Critical
    } else if failed > 0 || summary.alarming_count > 0 {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    };

    let success_rate = summary
        .success_rate()
        .map(|rate| format!("{:.1}%", rate))
        .unwrap_or_else(|| "N/A".to_string());

    let dim = Style::default().add_modifier(Modifier::DIM);
    let count_span = |count: u64, style: Style| {
        if count > 0 {
            Span::styled(format_count(count), style)
        } else {
            Span::styled("0", dim)
        }
    };

    let mut spans = vec![
        Span::styled(" ● ", theme.status_style(status)),
        Span::styled("TX BOARD ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(
            format_count(summary.total_transactions()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" tx "),
        Span::styled(success_rate, theme.status_style(status)),
        Span::raw(" ok │ "),
        Span::styled(format_count(summary.committed_count), Style::default().fg(theme.healthy)),
        Span::raw(" committed "),
        count_span(summary.rolled_back_count, Style::default().fg(theme.warning)),
        Span::raw(" rolled back "),
        count_span(
            summary.errored_count,
            Style::default().fg(theme.critical).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" errored │ avg "),
        Span::raw(format_millis(summary.average_duration())),
        Span::raw(" conn "),
        Span::raw(format_millis(summary.average_connection_occupied_time())),
    ];

    spans.extend(trend_spans(&app.history, theme));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Throughput sparkline and rate, plus an alarm sparkline once any
/// alarming transactions have arrived between refreshes.
fn trend_spans(history: &History, theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let sparkline = render_sparkline(&history.transactions_sparkline());
    if !sparkline.trim().is_empty() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(sparkline, Style::default().fg(theme.highlight)));
    }
    if let Some(rate) = history.transaction_rate() {
        spans.push(Span::raw(format!(" {:.1}/s", rate)));
    }

    let alarming = history.alarming_sparkline();
    if alarming.iter().any(|&level| level > 0) {
        spans.push(Span::raw(" │ alarms "));
        spans.push(Span::styled(render_sparkline(&alarming), Style::default().fg(theme.warning)));
    }
    spans
}

/// Format a count for display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Last eight sparkline levels as block characters.
pub fn render_sparkline(data: &[u8]) -> String {
    if data.is_empty() {
        return "        ".to_string();
    }
    let skip = data.len().saturating_sub(8);
    data[skip..].iter().map(|&v| SPARKLINE_CHARS[v.min(7) as usize]).collect()
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![
        Line::from(" 1:Transactions "),
        Line::from(" 2:SQL Logs "),
        Line::from(" 3:Charts "),
    ];

    let selected = match app.current_view {
        View::Transactions => 0,
        View::SqlLogs => 1,
        View::Charts => 2,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows the data source, time since last update, threshold and
/// context-sensitive controls. Temporary messages and source errors
/// take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(ref err) = app.load_error {
        let paragraph = Paragraph::new(format!(
            " {} | Error: {} | r:retry q:quit",
            app.source_description(),
            err
        ))
        .style(Style::default().fg(app.theme.critical));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if let Some(updated) = app.data.last_updated {
        let threshold = &app.data.threshold;
        let pinned = if app.data.threshold_pinned { " (pinned)" } else { "" };

        let controls = if app.filter_active {
            "Type to search | Enter:apply Esc:cancel"
        } else {
            match app.current_view {
                View::Transactions => {
                    "Space:expand Enter:detail n/p:page /:search f:status s:sort ?:help q:quit"
                }
                View::SqlLogs => "n/p:page /:search s:sort S:reverse ?:help q:quit",
                View::Charts => "Tab:switch r:refresh ?:help q:quit",
            }
        };

        format!(
            " {} | Updated {:.1}s ago | tx>{} conn>{}{} | {}",
            app.source_description(),
            updated.elapsed().as_secs_f64(),
            format_millis(threshold.transaction as f64),
            format_millis(threshold.connection as f64),
            pinned,
            controls,
        )
    } else {
        format!(" {} | Loading... | q:quit", app.source_description())
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// One-line page footer: record range and the page-number strip.
pub fn page_footer<T>(app: &App, page: &PageResponse<T>) -> Line<'static> {
    let (first, last) = record_range(page);
    let mut spans = vec![Span::raw(format!(
        " Showing {}-{} of {} ",
        first, last, page.total_elements
    ))];

    for item in page_window(page.page.saturating_add(1), page.total_pages()) {
        match item {
            PageItem::Page { number, current: true } => {
                spans.push(Span::styled(format!("[{}]", number), app.theme.tab_active));
            }
            PageItem::Page { number, .. } => spans.push(Span::raw(format!(" {} ", number))),
            PageItem::Ellipsis => spans.push(Span::raw(" … ")),
        }
    }
    spans.push(Span::styled(
        format!("  {}/page", page.size),
        Style::default().add_modifier(Modifier::DIM),
    ));
    Line::from(spans)
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab 1/2/3 ←   Switch views"),
        Line::from("  ↑/↓ j/k       Navigate list"),
        Line::from("  PgUp/PgDn     Jump 10 items"),
        Line::from("  Home/End      Jump to first/last"),
        Line::from("  Space →       Expand/collapse children"),
        Line::from("  Enter         Transaction detail"),
        Line::from("  Esc           Go back"),
        Line::from(""),
        section(" Pages"),
        Line::from("  n/p           Next/previous page"),
        Line::from("  g/G           First/last page"),
        Line::from("  +/-           Page size"),
        Line::from(""),
        section(" Filters"),
        Line::from("  /             Search"),
        Line::from("  f o i x       Status, propagation,"),
        Line::from("                isolation, connection"),
        Line::from("  c             Clear filters"),
        Line::from("  s/S           Sort column/direction"),
        Line::from(""),
        section(" General"),
        Line::from("  r             Refresh"),
        Line::from("  t             Reload threshold"),
        Line::from("  e             Export page to CSV"),
        Line::from("  q             Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 46u16.min(area.width.saturating_sub(4));
    let help_height = 33u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::TransactionSummary;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1234), "1.2K");
        assert_eq!(format_count(2_500_000), "2.5M");
    }

    fn recorded(samples: &[(u64, u64)]) -> History {
        let mut history = History::new();
        for &(committed, alarming) in samples {
            history.record(&TransactionSummary {
                committed_count: committed,
                alarming_count: alarming,
                ..Default::default()
            });
        }
        history
    }

    fn text(spans: &[Span]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_alarm_trend_only_after_alarms() {
        let theme = Theme::dark();

        let quiet = trend_spans(&recorded(&[(0, 0), (5, 0), (9, 0)]), &theme);
        assert!(!text(&quiet).contains("alarms"));

        let alarming = trend_spans(&recorded(&[(0, 0), (5, 0), (9, 3)]), &theme);
        let line = text(&alarming);
        assert!(line.contains("alarms"));
        assert!(line.ends_with('█'));
    }

    #[test]
    fn test_sparkline_keeps_last_eight() {
        let data: Vec<u8> = (0..10).map(|v| v % 8).collect();
        let line = render_sparkline(&data);
        assert_eq!(line.chars().count(), 8);
        assert!(line.starts_with('▃'));
    }
}
