//! Application state and navigation logic.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info};

use crate::data::dashboard::{toggle_expanded, visible_rows};
use crate::data::model::{IsolationLevel, PropagationBehavior, TransactionPhaseStatus};
use crate::data::query::{Sort, SqlLogQuery, TransactionQuery, PAGE_SIZES};
use crate::data::{DashboardData, History, TransactionLog, TransactionRow};
use crate::export;
use crate::source::{DataSource, FetchRequest};
use crate::ui::Theme;

/// The current view/tab in the TUI.
///
/// Transaction detail is shown as an overlay (controlled by `App::detail`)
/// rather than as a separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Paginated transaction logs with expandable children.
    Transactions,
    /// Paginated SQL execution logs.
    SqlLogs,
    /// Status distribution and duration histogram.
    Charts,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Transactions => View::SqlLogs,
            View::SqlLogs => View::Charts,
            View::Charts => View::Transactions,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Transactions => View::Charts,
            View::SqlLogs => View::Transactions,
            View::Charts => View::SqlLogs,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Transactions => "Transactions",
            View::SqlLogs => "SQL Logs",
            View::Charts => "Charts",
        }
    }
}

/// Tabs of the transaction detail overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTab {
    Overview,
    Connection,
    Timing,
    Sql,
    Children,
    PostTxSql,
}

impl DetailTab {
    pub const ALL: [DetailTab; 6] = [
        DetailTab::Overview,
        DetailTab::Connection,
        DetailTab::Timing,
        DetailTab::Sql,
        DetailTab::Children,
        DetailTab::PostTxSql,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DetailTab::Overview => "Overview",
            DetailTab::Connection => "Connection",
            DetailTab::Timing => "Timing",
            DetailTab::Sql => "SQL",
            DetailTab::Children => "Children",
            DetailTab::PostTxSql => "Post-Tx SQL",
        }
    }

    /// Connection, timing and post-transaction tabs only describe
    /// top-level transactions.
    pub fn is_available(&self, top_level: bool, connection_oriented: bool) -> bool {
        match self {
            DetailTab::Overview | DetailTab::Sql | DetailTab::Children => true,
            DetailTab::Timing | DetailTab::PostTxSql => top_level,
            DetailTab::Connection => top_level && connection_oriented,
        }
    }
}

/// Open detail overlay: which transaction and which tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailState {
    /// Row path of the transaction being shown.
    pub path: Vec<usize>,
    pub tab: DetailTab,
    pub scroll: u16,
}

impl DetailState {
    pub fn is_top_level(&self) -> bool {
        self.path.len() == 1
    }
}

/// Sort properties offered by `s` on the transactions view.
pub const TRANSACTION_SORT_FIELDS: [&str; 5] =
    ["startTime", "duration", "method", "status", "thread"];

/// Sort properties offered by `s` on the SQL logs view.
pub const SQL_LOG_SORT_FIELDS: [&str; 3] = ["conAcquiredTime", "conOccupiedTime", "thread"];

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub detail: Option<DetailState>,

    // Data source
    source: Box<dyn DataSource>,
    pub data: DashboardData,
    pub history: History,
    pub load_error: Option<String>,

    // Requests
    pub tx_query: TransactionQuery,
    pub sql_query: SqlLogQuery,

    // Navigation state
    pub expanded: HashSet<Vec<usize>>,
    pub selected_tx_index: usize,
    pub selected_sql_index: usize,

    // Search input
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Where `e` writes CSV exports
    pub export_dir: PathBuf,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App with the given data source and initial dashboard state.
    pub fn new(source: Box<dyn DataSource>, data: DashboardData) -> Self {
        Self {
            running: true,
            current_view: View::Transactions,
            show_help: false,
            detail: None,
            source,
            data,
            history: History::new(),
            load_error: None,
            tx_query: TransactionQuery::default(),
            sql_query: SqlLogQuery::default(),
            expanded: HashSet::new(),
            selected_tx_index: 0,
            selected_sql_index: 0,
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::dark(),
            export_dir: PathBuf::from("."),
            status_message: None,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Use a page size for both paginated views.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.tx_query.size = size;
        self.sql_query.size = size;
        self
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Ask the source for the alarming threshold.
    pub fn fetch_threshold(&mut self) {
        if self.data.threshold_pinned {
            self.set_status_message("Threshold pinned on the command line".to_string());
            return;
        }
        self.source.request(FetchRequest::Threshold);
    }

    /// Request everything shown on screen: summary, chart and both current pages.
    pub fn refresh(&mut self) {
        debug!(page = self.tx_query.page, size = self.tx_query.size, "Refreshing");
        self.source.request(FetchRequest::Summary);
        self.source.request(FetchRequest::Chart);
        self.request_transactions();
        self.request_sql_logs();
    }

    fn request_transactions(&mut self) {
        self.source.request(FetchRequest::Transactions(self.tx_query.clone()));
    }

    fn request_sql_logs(&mut self) {
        self.source.request(FetchRequest::SqlLogs(self.sql_query.clone()));
    }

    /// Drain the data source of everything that has arrived.
    ///
    /// Returns Ok(true) if new data was received, Ok(false) if no new data.
    pub fn reload_data(&mut self) -> Result<bool> {
        let mut received = false;
        while let Some(update) = self.source.poll() {
            let transactions_changed = matches!(update, crate::source::Update::Transactions(_));
            if self.data.apply(update) {
                if let Some(ref summary) = self.data.summary {
                    self.history.record(summary);
                }
            }
            if transactions_changed && self.detail.is_some() && self.selected_transaction().is_none() {
                self.detail = None;
            }
            received = true;
        }

        self.follow_shrunk_pages();

        self.load_error = self.source.error().map(str::to_string);
        self.clamp_selection();
        Ok(received)
    }

    /// Step back to the last page when a page past the end was served,
    /// e.g. after the log shrank under a stale page count.
    fn follow_shrunk_pages(&mut self) {
        let served = self.data.transactions.as_ref().map(|p| (p.page, p.total_pages()));
        if let Some(last) = past_end(served) {
            if self.tx_query.page > last {
                debug!(page = self.tx_query.page, last, "Transactions page past the end");
                self.tx_query.page = last;
                self.expanded.clear();
                self.request_transactions();
            }
        }
        let served = self.data.sql_logs.as_ref().map(|p| (p.page, p.total_pages()));
        if let Some(last) = past_end(served) {
            if self.sql_query.page > last {
                debug!(page = self.sql_query.page, last, "SQL logs page past the end");
                self.sql_query.page = last;
                self.request_sql_logs();
            }
        }
    }

    fn clamp_selection(&mut self) {
        let tx_rows = self.transaction_rows().len();
        self.selected_tx_index = self.selected_tx_index.min(tx_rows.saturating_sub(1));
        let sql_rows = self.data.sql_log_rows().len();
        self.selected_sql_index = self.selected_sql_index.min(sql_rows.saturating_sub(1));
    }

    /// Visible rows of the transactions table.
    pub fn transaction_rows(&self) -> Vec<TransactionRow> {
        visible_rows(self.data.transaction_rows(), &self.expanded)
    }

    /// The transaction under the cursor (or shown by the detail overlay).
    pub fn selected_transaction(&self) -> Option<&TransactionLog> {
        if let Some(ref detail) = self.detail {
            return self.data.transaction_at(&detail.path);
        }
        let row = self.transaction_rows().into_iter().nth(self.selected_tx_index)?;
        self.data.transaction_at(&row.path)
    }

    /// Switch to the next view (cycles Transactions → SQL Logs → Charts).
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    fn row_count(&self) -> usize {
        match self.current_view {
            View::Transactions => self.transaction_rows().len(),
            View::SqlLogs => self.data.sql_log_rows().len(),
            View::Charts => 0,
        }
    }

    fn selection_mut(&mut self) -> Option<&mut usize> {
        match self.current_view {
            View::Transactions => Some(&mut self.selected_tx_index),
            View::SqlLogs => Some(&mut self.selected_sql_index),
            View::Charts => None,
        }
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.row_count().saturating_sub(1);
        if let Some(index) = self.selection_mut() {
            *index = (*index + n).min(max);
        }
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        if let Some(index) = self.selection_mut() {
            *index = index.saturating_sub(n);
        }
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        if let Some(index) = self.selection_mut() {
            *index = 0;
        }
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        let last = self.row_count().saturating_sub(1);
        if let Some(index) = self.selection_mut() {
            *index = last;
        }
    }

    /// Expand or collapse the children of the selected transaction.
    pub fn toggle_expand(&mut self) {
        if self.current_view != View::Transactions {
            return;
        }
        let Some(row) = self.transaction_rows().into_iter().nth(self.selected_tx_index) else {
            return;
        };
        if row.has_children {
            toggle_expanded(&mut self.expanded, &row.path);
        }
    }

    // ---- pagination ----

    fn current_page(&self) -> Option<(u32, u32)> {
        match self.current_view {
            View::Transactions => {
                let total = self.data.transactions.as_ref().map_or(1, |p| p.total_pages());
                Some((self.tx_query.page, total))
            }
            View::SqlLogs => {
                let total = self.data.sql_logs.as_ref().map_or(1, |p| p.total_pages());
                Some((self.sql_query.page, total))
            }
            View::Charts => None,
        }
    }

    /// Go to a zero-based page of the current view, clamped to the known range.
    pub fn go_to_page(&mut self, page: u32) {
        let Some((current, total)) = self.current_page() else {
            return;
        };
        let page = page.min(total.saturating_sub(1));
        if page == current {
            return;
        }
        match self.current_view {
            View::Transactions => {
                self.tx_query.page = page;
                self.selected_tx_index = 0;
                // Row paths refer to the previous page
                self.expanded.clear();
                self.request_transactions();
            }
            View::SqlLogs => {
                self.sql_query.page = page;
                self.selected_sql_index = 0;
                self.request_sql_logs();
            }
            View::Charts => {}
        }
    }

    pub fn next_page(&mut self) {
        if let Some((current, _)) = self.current_page() {
            self.go_to_page(current.saturating_add(1));
        }
    }

    pub fn prev_page(&mut self) {
        if let Some((current, _)) = self.current_page() {
            if current > 0 {
                self.go_to_page(current - 1);
            }
        }
    }

    pub fn first_page(&mut self) {
        self.go_to_page(0);
    }

    pub fn last_page(&mut self) {
        self.go_to_page(u32::MAX);
    }

    /// Step through the offered page sizes, back to the first page.
    pub fn cycle_page_size(&mut self, forward: bool) {
        let size = match self.current_view {
            View::Transactions => &mut self.tx_query.size,
            View::SqlLogs => &mut self.sql_query.size,
            View::Charts => return,
        };
        let position = PAGE_SIZES.iter().position(|s| s == size);
        let next = match (position, forward) {
            (Some(i), true) => (i + 1) % PAGE_SIZES.len(),
            (Some(i), false) => (i + PAGE_SIZES.len() - 1) % PAGE_SIZES.len(),
            (None, _) => 0,
        };
        *size = PAGE_SIZES[next];
        self.reset_to_first_page();
    }

    fn reset_to_first_page(&mut self) {
        match self.current_view {
            View::Transactions => {
                self.tx_query.page = 0;
                self.selected_tx_index = 0;
                self.expanded.clear();
                self.request_transactions();
            }
            View::SqlLogs => {
                self.sql_query.page = 0;
                self.selected_sql_index = 0;
                self.request_sql_logs();
            }
            View::Charts => {}
        }
    }

    // ---- detail overlay ----

    /// Open the detail overlay for the currently selected transaction.
    pub fn enter_detail(&mut self) {
        if self.current_view != View::Transactions {
            return;
        }
        if let Some(row) = self.transaction_rows().into_iter().nth(self.selected_tx_index) {
            self.detail = Some(DetailState {
                path: row.path,
                tab: DetailTab::Overview,
                scroll: 0,
            });
        }
    }

    /// Close the detail overlay if open.
    pub fn close_overlay(&mut self) {
        self.detail = None;
    }

    /// Tabs the open overlay can show.
    pub fn available_tabs(&self) -> Vec<DetailTab> {
        let Some(ref detail) = self.detail else {
            return Vec::new();
        };
        let connection_oriented =
            self.data.transaction_at(&detail.path).is_some_and(|tx| tx.connection_oriented);
        DetailTab::ALL
            .into_iter()
            .filter(|tab| tab.is_available(detail.is_top_level(), connection_oriented))
            .collect()
    }

    /// Show a tab; an unavailable tab falls back to Overview.
    pub fn select_tab(&mut self, tab: DetailTab) {
        let available = self.available_tabs();
        if let Some(ref mut detail) = self.detail {
            detail.tab = if available.contains(&tab) {
                tab
            } else {
                DetailTab::Overview
            };
            detail.scroll = 0;
        }
    }

    /// Move to the next (or previous) available tab.
    pub fn cycle_tab(&mut self, forward: bool) {
        let available = self.available_tabs();
        let Some(ref detail) = self.detail else {
            return;
        };
        let position = available.iter().position(|t| *t == detail.tab).unwrap_or(0);
        let len = available.len();
        let next = if forward {
            (position + 1) % len
        } else {
            (position + len - 1) % len
        };
        self.select_tab(available[next]);
    }

    pub fn scroll_detail(&mut self, down: bool) {
        if let Some(ref mut detail) = self.detail {
            detail.scroll = if down {
                detail.scroll.saturating_add(1)
            } else {
                detail.scroll.saturating_sub(1)
            };
        }
    }

    /// Navigate back: close overlay first, then return to Transactions.
    pub fn go_back(&mut self) {
        if self.detail.is_some() {
            self.detail = None;
            return;
        }
        if self.current_view != View::Transactions {
            self.current_view = View::Transactions;
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    // ---- sorting ----

    /// Move the current view's sort to the next column, ascending.
    pub fn cycle_sort(&mut self) {
        match self.current_view {
            View::Transactions => {
                let next = next_sort_field(&TRANSACTION_SORT_FIELDS, self.tx_query.sort.as_ref());
                self.tx_query.sort = Some(Sort::toggled(None, next));
            }
            View::SqlLogs => {
                let next = next_sort_field(&SQL_LOG_SORT_FIELDS, self.sql_query.sort.as_ref());
                self.sql_query.sort = Some(Sort::toggled(None, next));
            }
            View::Charts => return,
        }
        self.reset_to_first_page();
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        let sort = match self.current_view {
            View::Transactions => &mut self.tx_query.sort,
            View::SqlLogs => &mut self.sql_query.sort,
            View::Charts => return,
        };
        if let Some(current) = sort.take() {
            *sort = Some(Sort::toggled(Some(&current), &current.property));
        }
        self.reset_to_first_page();
    }

    // ---- filters ----

    /// Enter search input mode, starting from the current search text.
    pub fn start_filter(&mut self) {
        self.filter_text = match self.current_view {
            View::SqlLogs => self.sql_query.search.clone(),
            _ => self.tx_query.search.clone(),
        };
        self.filter_active = true;
    }

    /// Exit search input mode without applying.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Apply the typed search and go back to the first page.
    pub fn apply_filter(&mut self) {
        self.filter_active = false;
        match self.current_view {
            View::SqlLogs => self.sql_query.search = self.filter_text.clone(),
            _ => {
                self.current_view = View::Transactions;
                self.tx_query.search = self.filter_text.clone();
            }
        }
        self.reset_to_first_page();
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    pub fn cycle_status_filter(&mut self) {
        self.tx_query.status = cycle_option(&TransactionPhaseStatus::ALL, self.tx_query.status);
        self.filters_changed();
    }

    pub fn cycle_propagation_filter(&mut self) {
        self.tx_query.propagation =
            cycle_option(&PropagationBehavior::ALL, self.tx_query.propagation);
        self.filters_changed();
    }

    pub fn cycle_isolation_filter(&mut self) {
        self.tx_query.isolation = cycle_option(&IsolationLevel::ALL, self.tx_query.isolation);
        self.filters_changed();
    }

    pub fn cycle_connection_filter(&mut self) {
        self.tx_query.connection_oriented =
            cycle_option(&[true, false], self.tx_query.connection_oriented);
        self.filters_changed();
    }

    /// Drop every transaction filter.
    pub fn clear_filters(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
        match self.current_view {
            View::SqlLogs => self.sql_query.search.clear(),
            _ => self.tx_query.clear_filters(),
        }
        self.reset_to_first_page();
    }

    fn filters_changed(&mut self) {
        self.current_view = View::Transactions;
        self.reset_to_first_page();
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current transaction page as CSV into the export directory.
    pub fn export_transactions(&self) -> Result<PathBuf> {
        let path = self.export_dir.join(export::default_file_name(chrono::Local::now().date_naive()));
        self.export_transactions_to(&path)?;
        Ok(path)
    }

    pub fn export_transactions_to(&self, path: &Path) -> Result<()> {
        let Some(ref page) = self.data.transactions else {
            anyhow::bail!("No transactions to export");
        };
        export::write_csv_file(path, &page.content)?;
        info!(path = %path.display(), rows = page.content.len(), "Exported transactions");
        Ok(())
    }
}

/// Last zero-based page when a served `(page, total_pages)` lies past it.
fn past_end(served: Option<(u32, u32)>) -> Option<u32> {
    let (page, total_pages) = served?;
    let last = total_pages.saturating_sub(1);
    (page > last).then_some(last)
}

fn next_sort_field<'a>(fields: &[&'a str], current: Option<&Sort>) -> &'a str {
    let position = current.and_then(|sort| fields.iter().position(|f| *f == sort.property));
    match position {
        Some(i) => fields[(i + 1) % fields.len()],
        None => fields[0],
    }
}

/// None → first → … → last → None.
fn cycle_option<T: Copy + PartialEq>(values: &[T], current: Option<T>) -> Option<T> {
    match current {
        None => values.first().copied(),
        Some(value) => {
            let position = values.iter().position(|v| *v == value)?;
            values.get(position + 1).copied()
        }
    }
}
