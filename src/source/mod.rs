//! Data source abstraction for the dashboard.
//!
//! The UI asks a source for data with [`DataSource::request`] and collects
//! the answers with [`DataSource::poll`]. The HTTP source talks to a live
//! Transaction Log Service; the file source serves an offline JSON dump.

mod error;
mod file;
mod http;

pub use error::SourceError;
pub use file::{Dump, FileSource};
pub use http::{HttpSource, DEFAULT_API_PREFIX};

use std::fmt::Debug;

use crate::data::model::{
    AlarmingThreshold, PageResponse, SqlExecutionLog, TransactionChart, TransactionLog,
    TransactionSummary,
};
use crate::data::query::{SqlLogQuery, TransactionQuery};

/// Something the dashboard wants fetched.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    Threshold,
    Summary,
    Chart,
    Transactions(TransactionQuery),
    SqlLogs(SqlLogQuery),
}

/// A fetched piece of dashboard data.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Threshold(AlarmingThreshold),
    Summary(TransactionSummary),
    Chart(TransactionChart),
    Transactions(PageResponse<TransactionLog>),
    SqlLogs(PageResponse<SqlExecutionLog>),
}

/// Trait for fetching dashboard data from various backends.
///
/// # Example
///
/// ```no_run
/// use txboard_tui::source::{DataSource, FetchRequest, FileSource};
///
/// let mut source = FileSource::new("txboard-dump.json");
/// source.request(FetchRequest::Summary);
/// if let Some(update) = source.poll() {
///     println!("Got {:?}", update);
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Queue a request. Answers arrive through [`DataSource::poll`] in
    /// request order.
    fn request(&mut self, request: FetchRequest);

    /// Take the next available answer.
    ///
    /// Returns `Some(update)` if new data is available, `None` otherwise.
    /// This method should be non-blocking.
    fn poll(&mut self) -> Option<Update>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// Returns the message of the last failed request, cleared by the next
    /// success.
    fn error(&self) -> Option<&str>;
}
