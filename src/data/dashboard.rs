//! Last-received dashboard state and per-transaction health.

use std::collections::HashSet;
use std::time::Instant;

use super::model::{
    AlarmingThreshold, PageResponse, SqlExecutionLog, TransactionChart, TransactionLog,
    TransactionPhaseStatus, TransactionSummary,
};
use crate::source::Update;

/// Health status for a transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Classify a transaction. Anything not committed is critical.
    pub fn of(tx: &TransactionLog) -> Self {
        if tx.status != TransactionPhaseStatus::Committed {
            HealthStatus::Critical
        } else if !tx.is_healthy() {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }

    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "OK",
            HealthStatus::Warning => "WARN",
            HealthStatus::Critical => "CRIT",
        }
    }
}

/// Everything the dashboard has received so far.
///
/// Each part is replaced wholesale when a newer one arrives; a failed
/// fetch leaves the previous value in place.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub threshold: AlarmingThreshold,
    /// Threshold was set locally and fetched values are ignored.
    pub threshold_pinned: bool,
    pub summary: Option<TransactionSummary>,
    pub chart: Option<TransactionChart>,
    pub transactions: Option<PageResponse<TransactionLog>>,
    pub sql_logs: Option<PageResponse<SqlExecutionLog>>,
    pub last_updated: Option<Instant>,
}

impl Default for DashboardData {
    fn default() -> Self {
        Self::new(AlarmingThreshold::default(), false)
    }
}

impl DashboardData {
    pub fn new(threshold: AlarmingThreshold, threshold_pinned: bool) -> Self {
        Self {
            threshold,
            threshold_pinned,
            summary: None,
            chart: None,
            transactions: None,
            sql_logs: None,
            last_updated: None,
        }
    }

    /// Merge an update. Returns true when the summary changed.
    pub fn apply(&mut self, update: Update) -> bool {
        self.last_updated = Some(Instant::now());
        match update {
            Update::Threshold(threshold) => {
                if !self.threshold_pinned {
                    self.threshold = threshold;
                }
                false
            }
            Update::Summary(summary) => {
                self.summary = Some(summary);
                true
            }
            Update::Chart(chart) => {
                self.chart = Some(chart);
                false
            }
            Update::Transactions(page) => {
                self.transactions = Some(page);
                false
            }
            Update::SqlLogs(page) => {
                self.sql_logs = Some(page);
                false
            }
        }
    }

    pub fn transaction_rows(&self) -> &[TransactionLog] {
        self.transactions.as_ref().map(|p| p.content.as_slice()).unwrap_or(&[])
    }

    pub fn sql_log_rows(&self) -> &[SqlExecutionLog] {
        self.sql_logs.as_ref().map(|p| p.content.as_slice()).unwrap_or(&[])
    }

    /// Resolve a row path (indices from the top-level list down) to a transaction.
    pub fn transaction_at(&self, path: &[usize]) -> Option<&TransactionLog> {
        let (first, rest) = path.split_first()?;
        let mut tx = self.transaction_rows().get(*first)?;
        for &index in rest {
            tx = tx.children.get(index)?;
        }
        Some(tx)
    }

    /// Per-status counts with their share of the total.
    pub fn status_distribution(&self) -> Vec<StatusShare> {
        let Some(summary) = self.summary else {
            return Vec::new();
        };
        let total = summary.total_transactions();
        TransactionPhaseStatus::ALL
            .iter()
            .map(|&status| {
                let count = match status {
                    TransactionPhaseStatus::Committed => summary.committed_count,
                    TransactionPhaseStatus::RolledBack => summary.rolled_back_count,
                    TransactionPhaseStatus::Errored => summary.errored_count,
                };
                let percent = if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64 * 100.0
                };
                StatusShare {
                    status,
                    count,
                    percent,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusShare {
    pub status: TransactionPhaseStatus,
    pub count: u64,
    pub percent: f64,
}

/// A visible row of the transactions table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRow {
    /// Indices from the top-level list down to this transaction.
    pub path: Vec<usize>,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
}

impl TransactionRow {
    pub fn is_top_level(&self) -> bool {
        self.depth == 0
    }
}

/// Flatten a transaction page into visible rows; children of expanded rows
/// follow their parent.
pub fn visible_rows(
    transactions: &[TransactionLog],
    expanded: &HashSet<Vec<usize>>,
) -> Vec<TransactionRow> {
    let mut rows = Vec::new();
    for (index, tx) in transactions.iter().enumerate() {
        push_rows(tx, vec![index], expanded, &mut rows);
    }
    rows
}

fn push_rows(
    tx: &TransactionLog,
    path: Vec<usize>,
    expanded: &HashSet<Vec<usize>>,
    rows: &mut Vec<TransactionRow>,
) {
    let is_expanded = expanded.contains(&path);
    rows.push(TransactionRow {
        path: path.clone(),
        depth: path.len() - 1,
        has_children: !tx.children.is_empty(),
        expanded: is_expanded,
    });
    if is_expanded {
        for (index, child) in tx.children.iter().enumerate() {
            let mut child_path = path.clone();
            child_path.push(index);
            push_rows(child, child_path, expanded, rows);
        }
    }
}

/// Toggle a row; collapsing also collapses every descendant.
pub fn toggle_expanded(expanded: &mut HashSet<Vec<usize>>, path: &[usize]) {
    if expanded.remove(path) {
        expanded.retain(|p| !(p.len() > path.len() && p.starts_with(path)));
    } else {
        expanded.insert(path.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{IsolationLevel, PropagationBehavior};
    use chrono::Utc;

    fn tx(method: &str, children: Vec<TransactionLog>) -> TransactionLog {
        let now = Utc::now();
        TransactionLog {
            tx_id: None,
            method: method.to_string(),
            propagation: PropagationBehavior::Required,
            isolation: IsolationLevel::Default,
            start_time: now,
            end_time: now,
            duration: 10,
            connection_summary: None,
            status: TransactionPhaseStatus::Committed,
            thread: None,
            executed_quires: Vec::new(),
            children,
            events: Vec::new(),
            alarming_transaction: false,
            having_alarming_connection: None,
            post_transaction_quires: Vec::new(),
            connection_oriented: false,
            total_transaction_count: None,
            total_query_count: None,
        }
    }

    fn tree() -> Vec<TransactionLog> {
        vec![
            tx("a", vec![tx("a.0", vec![tx("a.0.0", vec![])]), tx("a.1", vec![])]),
            tx("b", vec![]),
        ]
    }

    #[test]
    fn test_health_classification() {
        let mut t = tx("a", vec![]);
        assert_eq!(HealthStatus::of(&t), HealthStatus::Healthy);

        t.having_alarming_connection = Some(true);
        assert_eq!(HealthStatus::of(&t), HealthStatus::Warning);

        t.status = TransactionPhaseStatus::RolledBack;
        assert_eq!(HealthStatus::of(&t), HealthStatus::Critical);
    }

    #[test]
    fn test_collapsed_rows() {
        let rows = visible_rows(&tree(), &HashSet::new());
        assert_eq!(rows.len(), 2);
        assert!(rows[0].has_children);
        assert!(!rows[1].has_children);
    }

    #[test]
    fn test_expanded_rows_follow_parent() {
        let mut expanded = HashSet::new();
        toggle_expanded(&mut expanded, &[0]);
        toggle_expanded(&mut expanded, &[0, 0]);
        let rows = visible_rows(&tree(), &expanded);
        let paths: Vec<Vec<usize>> = rows.iter().map(|r| r.path.clone()).collect();
        assert_eq!(
            paths,
            vec![vec![0], vec![0, 0], vec![0, 0, 0], vec![0, 1], vec![1]]
        );
        assert_eq!(rows[2].depth, 2);
    }

    #[test]
    fn test_collapse_removes_descendants() {
        let mut expanded = HashSet::new();
        toggle_expanded(&mut expanded, &[0]);
        toggle_expanded(&mut expanded, &[0, 0]);
        toggle_expanded(&mut expanded, &[1]);
        toggle_expanded(&mut expanded, &[0]);
        assert!(!expanded.contains(&vec![0, 0]));
        assert!(expanded.contains(&vec![1]));

        // re-expanding the parent does not resurrect the child
        toggle_expanded(&mut expanded, &[0]);
        assert_eq!(visible_rows(&tree(), &expanded).len(), 4);
    }

    #[test]
    fn test_transaction_at_path() {
        let mut data = DashboardData::default();
        data.apply(Update::Transactions(PageResponse::new(tree(), 0, 10, 2)));
        assert_eq!(data.transaction_at(&[0, 0, 0]).map(|t| t.method.as_str()), Some("a.0.0"));
        assert!(data.transaction_at(&[0, 5]).is_none());
        assert!(data.transaction_at(&[]).is_none());
    }

    #[test]
    fn test_pinned_threshold_ignores_updates() {
        let pinned = AlarmingThreshold {
            transaction: 50,
            connection: 60,
        };
        let mut data = DashboardData::new(pinned, true);
        data.apply(Update::Threshold(AlarmingThreshold::default()));
        assert_eq!(data.threshold, pinned);

        let mut data = DashboardData::default();
        data.apply(Update::Threshold(pinned));
        assert_eq!(data.threshold, pinned);
    }

    #[test]
    fn test_status_distribution() {
        let mut data = DashboardData::default();
        assert!(data.status_distribution().is_empty());

        let changed = data.apply(Update::Summary(TransactionSummary {
            committed_count: 3,
            errored_count: 1,
            ..Default::default()
        }));
        assert!(changed);
        let shares = data.status_distribution();
        assert_eq!(shares.len(), 3);
        assert_eq!(shares[0].percent, 75.0);
        assert_eq!(shares[1].count, 0);
        assert_eq!(shares[2].percent, 25.0);
    }
}
