//! Charts view rendering.
//!
//! Left: share of each final status. Right: the duration histogram.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::model::DurationRange;

/// Width of the percentage bar next to each status.
const SHARE_BAR_WIDTH: usize = 20;

/// Render the Charts view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).split(area);

    render_status_distribution(frame, app, chunks[0]);
    render_duration_histogram(frame, app, chunks[1]);
}

fn block<'a>(app: &App, title: &'a str) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
}

fn render_status_distribution(frame: &mut Frame, app: &App, area: Rect) {
    let shares = app.data.status_distribution();
    let lines: Vec<Line> = if shares.is_empty() {
        vec![waiting("Waiting for summary...")]
    } else {
        let mut lines = Vec::with_capacity(shares.len() * 2);
        for share in shares {
            let filled = ((share.percent / 100.0) * SHARE_BAR_WIDTH as f64).round() as usize;
            let color = app.theme.phase_color(share.status);
            lines.push(Line::from(vec![
                Span::styled(
                    format!(" {:<12}", share.status.label()),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{:>6} ", share.count)),
                Span::raw(format!("{:>5.1}%", share.percent)),
            ]));
            lines.push(Line::from(vec![
                Span::raw(" "),
                Span::styled("█".repeat(filled.min(SHARE_BAR_WIDTH)), Style::default().fg(color)),
                Span::styled(
                    "░".repeat(SHARE_BAR_WIDTH - filled.min(SHARE_BAR_WIDTH)),
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ]));
        }
        lines
    };

    frame.render_widget(
        Paragraph::new(lines).block(block(app, " Status Distribution ")),
        area,
    );
}

fn render_duration_histogram(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref chart) = app.data.chart else {
        frame.render_widget(
            Paragraph::new(waiting("Waiting for chart data...")).block(block(app, " Duration ")),
            area,
        );
        return;
    };

    let threshold = app.data.threshold.transaction;
    let bars: Vec<Bar> = chart
        .duration_distribution
        .iter()
        .map(|bucket| {
            // Buckets reaching past the threshold hold alarming transactions
            let color = if bucket.range.max_millis > threshold {
                app.theme.warning
            } else {
                app.theme.highlight
            };
            Bar::default()
                .value(bucket.count)
                .label(Line::from(bucket_label(&bucket.range)))
                .style(Style::default().fg(color))
        })
        .collect();

    let count = bars.len().max(1) as u16;
    let inner_width = area.width.saturating_sub(2);
    let bar_width = (inner_width / count).saturating_sub(1).clamp(3, 12);

    let chart = BarChart::default()
        .block(block(app, " Duration Distribution "))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .value_style(Style::default().add_modifier(Modifier::BOLD));

    frame.render_widget(chart, area);
}

/// Short axis label; the open-ended overflow bucket reads `5000ms+`.
fn bucket_label(range: &DurationRange) -> String {
    if range.max_millis == i64::MAX {
        format!("{}ms+", range.min_millis)
    } else {
        format!("<{}ms", range.max_millis)
    }
}

fn waiting(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {}", text),
        Style::default().add_modifier(Modifier::DIM),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_labels() {
        assert_eq!(bucket_label(&DurationRange::new(100, 500)), "<500ms");
        assert_eq!(bucket_label(&DurationRange::new(5000, i64::MAX)), "5000ms+");
    }
}
