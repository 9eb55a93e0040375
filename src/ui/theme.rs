//! Colors and styles, with a dark and a light variant.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::model::TransactionPhaseStatus;
use crate::data::HealthStatus;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] to follow the terminal background, or
/// [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Alarming spans and slow transactions.
    pub warning: Color,
    /// Rolled-back and errored transactions.
    pub critical: Color,
    /// Committed transactions.
    pub healthy: Color,
    pub border: Color,
    /// Table header rows.
    pub header: Style,
    pub selected: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub border_type: BorderType,

    // SQL highlighting
    pub sql_keyword: Style,
    pub sql_string: Style,
    pub sql_number: Style,
    pub sql_comment: Style,
}

impl Theme {
    /// Dark theme for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
            sql_keyword: Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            sql_string: Style::default().fg(Color::Green),
            sql_number: Style::default().fg(Color::LightYellow),
            sql_comment: Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        }
    }

    /// Light theme for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Rgb(176, 112, 0),
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
            sql_keyword: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            sql_string: Style::default().fg(Color::Rgb(0, 128, 0)),
            sql_number: Style::default().fg(Color::Rgb(128, 0, 128)),
            sql_comment: Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a health status
    pub fn status_style(&self, status: HealthStatus) -> Style {
        match status {
            HealthStatus::Healthy => Style::default().fg(self.healthy),
            HealthStatus::Warning => Style::default().fg(self.warning),
            HealthStatus::Critical => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }

    /// Color of a transaction's final phase.
    pub fn phase_color(&self, status: TransactionPhaseStatus) -> Color {
        match status {
            TransactionPhaseStatus::Committed => self.healthy,
            TransactionPhaseStatus::RolledBack => self.warning,
            TransactionPhaseStatus::Errored => self.critical,
        }
    }

    /// Style for a value that crossed its threshold.
    pub fn alarm(&self, alarming: bool) -> Style {
        if alarming {
            Style::default().fg(self.warning).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    }
}
