//! File-based data source.
//!
//! Serves an offline JSON dump of the Transaction Log Service.

use std::collections::VecDeque;
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{DataSource, FetchRequest, SourceError, Update};
use crate::data::model::{
    AlarmingThreshold, SqlExecutionLog, TransactionChart, TransactionLog, TransactionSummary,
    DEFAULT_DURATION_BUCKETS,
};

/// Contents of a dump file.
///
/// ```json
/// {
///   "threshold": { "transaction": 1000, "connection": 500 },
///   "summary": { "committedCount": 3, ... },
///   "chart": { "durationDistribution": [...] },
///   "transactions": [ ... ],
///   "sqlLogs": [ ... ]
/// }
/// ```
///
/// Everything is optional. A missing summary or chart is derived from the
/// transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dump {
    #[serde(default)]
    pub threshold: Option<AlarmingThreshold>,
    #[serde(default)]
    pub summary: Option<TransactionSummary>,
    #[serde(default)]
    pub chart: Option<TransactionChart>,
    #[serde(default)]
    pub transactions: Vec<TransactionLog>,
    #[serde(default)]
    pub sql_logs: Vec<SqlExecutionLog>,
}

impl Dump {
    pub fn summary(&self) -> TransactionSummary {
        self.summary.unwrap_or_else(|| {
            let mut summary = TransactionSummary::default();
            for tx in &self.transactions {
                summary.record(tx);
            }
            summary
        })
    }

    pub fn chart(&self) -> TransactionChart {
        self.chart.clone().unwrap_or_else(|| {
            TransactionChart::from_transactions(&self.transactions, &DEFAULT_DURATION_BUCKETS)
        })
    }

    fn answer(&self, request: FetchRequest) -> Result<Update, SourceError> {
        Ok(match request {
            FetchRequest::Threshold => Update::Threshold(self.threshold.unwrap_or_default()),
            FetchRequest::Summary => Update::Summary(self.summary()),
            FetchRequest::Chart => Update::Chart(self.chart()),
            FetchRequest::Transactions(query) => {
                query.validate()?;
                Update::Transactions(query.apply(&self.transactions))
            }
            FetchRequest::SqlLogs(query) => {
                query.validate()?;
                Update::SqlLogs(query.apply(&self.sql_logs))
            }
        })
    }
}

/// A data source that answers requests from a JSON dump file.
///
/// The source tracks the file's modification time and re-reads the dump
/// when the file has been updated. Requests are answered locally, one per
/// poll, in the order they were made. A repeated request of the same kind
/// replaces the queued one.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    /// The latest read failed; answers come from the previous dump.
    stale: bool,
    last_modified: Option<SystemTime>,
    dump: Option<Dump>,
    pending: VecDeque<FetchRequest>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            stale: false,
            last_modified: None,
            dump: None,
            pending: VecDeque::new(),
        }
    }

    /// Returns the path being served.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the file's modification time.
    fn get_modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn read_file(&self) -> Result<Dump, SourceError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Re-read the dump if the file changed since the last successful read.
    fn refresh_dump(&mut self) {
        let current_modified = self.get_modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,
            (Some(_), None) => false, // File disappeared, keep serving the last dump
            (Some(last), Some(current)) => current > last,
        };
        if !file_changed {
            return;
        }

        match self.read_file() {
            Ok(dump) => {
                debug!(
                    path = %self.path.display(),
                    transactions = dump.transactions.len(),
                    sql_logs = dump.sql_logs.len(),
                    "Loaded dump"
                );
                self.last_modified = current_modified;
                self.last_error = None;
                self.stale = false;
                self.dump = Some(dump);
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to load dump");
                self.last_error = Some(e.to_string());
                self.stale = true;
            }
        }
    }
}

impl DataSource for FileSource {
    fn request(&mut self, request: FetchRequest) {
        // At most one queued request per kind; the newest query wins
        let kind = mem::discriminant(&request);
        match self.pending.iter_mut().find(|queued| mem::discriminant(*queued) == kind) {
            Some(queued) => *queued = request,
            None => self.pending.push_back(request),
        }
    }

    fn poll(&mut self) -> Option<Update> {
        self.refresh_dump();
        let dump = self.dump.as_ref()?;
        let request = self.pending.pop_front()?;

        match dump.answer(request) {
            Ok(update) => {
                if !self.stale {
                    self.last_error = None;
                }
                Some(update)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
