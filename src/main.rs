// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod data;
mod events;
mod export;
mod source;
mod ui;

use crate::config::Settings;
use app::{App, View};
use data::query::TransactionQuery;
use data::DashboardData;
use source::{DataSource, FetchRequest, FileSource, HttpSource, Update};

#[derive(Parser, Debug)]
#[command(name = "txboard")]
#[command(about = "Terminal dashboard for transaction and SQL execution logs")]
struct Args {
    /// Base URL of the Transaction Log Service (e.g. http://localhost:8080)
    #[arg(short, long, conflicts_with = "file")]
    url: Option<String>,

    /// Read a JSON dump instead of a live service
    #[arg(short, long, conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Path prefix of the service endpoints
    #[arg(long)]
    api_prefix: Option<String>,

    /// Refresh interval in seconds
    #[arg(short, long)]
    refresh: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Rows per page (10, 25, 50 or 100 are offered in the UI)
    #[arg(long)]
    page_size: Option<u32>,

    /// Pin the transaction threshold (e.g., "1s", "500ms")
    #[arg(long)]
    tx_threshold: Option<String>,

    /// Pin the connection threshold (e.g., "1s", "500ms")
    #[arg(long)]
    conn_threshold: Option<String>,

    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file (RUST_LOG controls the level)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Export the first transactions page to CSV and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

impl Args {
    /// Command-line flags take precedence over the file and environment.
    fn apply(&self, settings: &mut Settings) {
        if let Some(ref url) = self.url {
            settings.url = Some(url.clone());
            settings.file = None;
        }
        if let Some(ref file) = self.file {
            settings.file = Some(file.clone());
            settings.url = None;
        }
        if let Some(ref prefix) = self.api_prefix {
            settings.api_prefix = prefix.clone();
        }
        if let Some(refresh) = self.refresh {
            settings.refresh = refresh;
        }
        if let Some(timeout) = self.timeout {
            settings.timeout = timeout;
        }
        if let Some(page_size) = self.page_size {
            settings.page_size = page_size;
        }
        if self.tx_threshold.is_some() {
            settings.tx_threshold = self.tx_threshold.clone();
        }
        if self.conn_threshold.is_some() {
            settings.conn_threshold = self.conn_threshold.clone();
        }
        if self.log_file.is_some() {
            settings.log_file = self.log_file.clone();
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;

    init_logging(settings.log_file.as_deref())?;

    let data = match settings.pinned_threshold()? {
        Some(threshold) => DashboardData::new(threshold, true),
        None => DashboardData::default(),
    };

    match (settings.url.clone(), settings.file.clone()) {
        (Some(_), Some(_)) => bail!("Set either a service URL or a dump file, not both"),
        (Some(url), None) => run_with_http(&url, &settings, data, args.export.as_deref()),
        (None, Some(path)) => {
            let source = Box::new(FileSource::new(&path));
            match args.export {
                Some(ref export_path) => export_to_file(source, &settings, export_path),
                None => run_tui(source, &settings, data),
            }
        }
        (None, None) => bail!("No data source: pass --url or --file, or set one in the config file"),
    }
}

/// Log to a file; the terminal belongs to the UI. Without a file, logging is off.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(())
}

/// Run against a live Transaction Log Service
fn run_with_http(
    url: &str,
    settings: &Settings,
    data: DashboardData,
    export: Option<&Path>,
) -> Result<()> {
    // The fetch task lives on this runtime; keep it alive until the UI exits
    let rt = tokio::runtime::Runtime::new()?;

    let source = rt.block_on(async {
        HttpSource::spawn(url, &settings.api_prefix, settings.request_timeout())
    })?;
    info!(url, "Connected to transaction log service");

    match export {
        Some(path) => export_to_file(Box::new(source), settings, path),
        None => run_tui(Box::new(source), settings, data),
    }
}

/// Run the TUI with the given data source
fn run_tui(source: Box<dyn DataSource>, settings: &Settings, data: DashboardData) -> Result<()> {
    // Detect the theme before raw mode takes over the terminal
    let theme = settings.theme.theme();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    // Create app and request initial data
    let mut app = App::new(source, data)
        .with_theme(theme)
        .with_page_size(settings.page_size);
    if !app.data.threshold_pinned {
        app.fetch_threshold();
    }
    app.refresh();

    // Run the main loop
    let result = run_app(&mut terminal, &mut app, settings.refresh_interval());

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        // Pick up whatever the source has delivered since the last frame
        if let Err(e) = app.reload_data() {
            warn!(error = %e, "Failed to apply updates");
        }

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                frame.render_widget(paragraph, size_warning_area(area));
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Transactions => ui::transactions::render(frame, app, chunks[2]),
                View::SqlLogs => ui::sql_logs::render(frame, app, chunks[2]),
                View::Charts => ui::charts::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.detail.is_some() {
                ui::detail::render_overlay(frame, app, area);
            }

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    // Content starts after header (1) + tabs (1) + table border (1)
                    events::handle_mouse_event(app, mouse, 3);
                }
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Auto-refresh data periodically
        if last_refresh.elapsed() >= refresh_interval {
            app.refresh();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Five centered rows for the size warning, or the whole area if shorter.
fn size_warning_area(area: Rect) -> Rect {
    let height = area.height.min(5);
    Rect::new(area.x, area.y + (area.height / 2).saturating_sub(2), area.width, height)
}

/// Fetch the first transactions page and write it as CSV.
fn export_to_file(
    mut source: Box<dyn DataSource>,
    settings: &Settings,
    export_path: &Path,
) -> Result<()> {
    let query = TransactionQuery {
        size: settings.page_size,
        ..Default::default()
    };
    source.request(FetchRequest::Transactions(query));

    // Leave the request time to fail on its own before giving up
    let deadline = Instant::now() + settings.request_timeout() + Duration::from_secs(1);
    let page = loop {
        match source.poll() {
            Some(Update::Transactions(page)) => break page,
            Some(_) => continue,
            None => {}
        }
        if let Some(err) = source.error() {
            bail!("Failed to fetch transactions from {}: {}", source.description(), err);
        }
        if Instant::now() >= deadline {
            bail!("Timed out fetching transactions from {}", source.description());
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    export::write_csv_file(export_path, &page.content)?;
    info!(path = %export_path.display(), rows = page.content.len(), "Exported transactions");

    println!(
        "Exported {} transactions to: {}",
        page.content.len(),
        export_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_warning_area_fits_tiny_terminals() {
        for height in 0..4 {
            let area = size_warning_area(Rect::new(0, 0, 20, height));
            assert!(area.bottom() <= height);
        }
        assert_eq!(size_warning_area(Rect::new(0, 0, 40, 10)), Rect::new(0, 3, 40, 5));
    }
}
