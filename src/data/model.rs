//! Wire types for the Transaction Log Service.
//!
//! These types match the JSON served by the service's REST endpoints
//! (camelCase keys, ISO-8601 timestamps, durations in milliseconds).
//! Lists the service may omit default to empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Thresholds above which a span is flagged as alarming.
///
/// Served by `/config/alarming-threshold`. Both values are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmingThreshold {
    /// Transaction span threshold.
    pub transaction: i64,
    /// Connection-occupancy span threshold.
    pub connection: i64,
}

impl Default for AlarmingThreshold {
    fn default() -> Self {
        Self {
            transaction: 1000,
            connection: 1000,
        }
    }
}

/// Lifecycle event kind recorded for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    TransactionStart,
    TransactionEnd,
    ConnectionAcquired,
    ConnectionReleased,
    /// Any event type this client does not know about.
    #[serde(other)]
    Other,
}

impl EventKind {
    /// Marker class used to style the timeline point.
    pub fn marker_class(&self) -> &'static str {
        match self {
            EventKind::TransactionStart => "start",
            EventKind::TransactionEnd => "end",
            EventKind::ConnectionAcquired => "connection-acquired",
            EventKind::ConnectionReleased => "connection-released",
            EventKind::Other => "other",
        }
    }
}

/// A single timestamped lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub details: Option<String>,
}

impl TransactionEvent {
    pub fn new(kind: EventKind, timestamp: DateTime<Utc>, details: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp,
            details: Some(details.into()),
        }
    }
}

/// Final phase of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionPhaseStatus {
    Committed,
    RolledBack,
    Errored,
}

impl TransactionPhaseStatus {
    pub const ALL: [TransactionPhaseStatus; 3] = [
        TransactionPhaseStatus::Committed,
        TransactionPhaseStatus::RolledBack,
        TransactionPhaseStatus::Errored,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionPhaseStatus::Committed => "Committed",
            TransactionPhaseStatus::RolledBack => "Rolled Back",
            TransactionPhaseStatus::Errored => "Errored",
        }
    }

    /// Name as sent on the wire (query parameters, CSV).
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionPhaseStatus::Committed => "COMMITTED",
            TransactionPhaseStatus::RolledBack => "ROLLED_BACK",
            TransactionPhaseStatus::Errored => "ERRORED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropagationBehavior {
    Required,
    Supports,
    Mandatory,
    RequiresNew,
    NotSupported,
    Never,
    Nested,
    // serde requires `other` on the last variant; ordering follows `ALL`.
    #[serde(other)]
    Unknown,
}

impl PartialOrd for PropagationBehavior {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PropagationBehavior {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let pos = |v: &Self| Self::ALL.iter().position(|a| a == v);
        pos(self).cmp(&pos(other))
    }
}

impl PropagationBehavior {
    pub const ALL: [PropagationBehavior; 8] = [
        PropagationBehavior::Unknown,
        PropagationBehavior::Required,
        PropagationBehavior::Supports,
        PropagationBehavior::Mandatory,
        PropagationBehavior::RequiresNew,
        PropagationBehavior::NotSupported,
        PropagationBehavior::Never,
        PropagationBehavior::Nested,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropagationBehavior::Unknown => "UNKNOWN",
            PropagationBehavior::Required => "REQUIRED",
            PropagationBehavior::Supports => "SUPPORTS",
            PropagationBehavior::Mandatory => "MANDATORY",
            PropagationBehavior::RequiresNew => "REQUIRES_NEW",
            PropagationBehavior::NotSupported => "NOT_SUPPORTED",
            PropagationBehavior::Never => "NEVER",
            PropagationBehavior::Nested => "NESTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
    // serde requires `other` on the last variant; ordering follows `ALL`.
    #[serde(other)]
    Default,
}

impl PartialOrd for IsolationLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IsolationLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let pos = |v: &Self| Self::ALL.iter().position(|a| a == v);
        pos(self).cmp(&pos(other))
    }
}

impl IsolationLevel {
    pub const ALL: [IsolationLevel; 5] = [
        IsolationLevel::Default,
        IsolationLevel::ReadUncommitted,
        IsolationLevel::ReadCommitted,
        IsolationLevel::RepeatableRead,
        IsolationLevel::Serializable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IsolationLevel::Default => "DEFAULT",
            IsolationLevel::ReadUncommitted => "READ_UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ_COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE_READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Connection usage aggregated over a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub acquisition_count: u64,
    pub alarming_connection_count: u64,
    /// Total connection occupied time in milliseconds.
    pub occupied_time: i64,
}

/// A logged transaction, possibly with nested child transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<u64>,
    pub method: String,
    pub propagation: PropagationBehavior,
    pub isolation: IsolationLevel,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Transaction duration in milliseconds.
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_summary: Option<ConnectionSummary>,
    pub status: TransactionPhaseStatus,
    #[serde(default)]
    pub thread: Option<String>,
    #[serde(default)]
    pub executed_quires: Vec<String>,
    #[serde(default, rename = "child")]
    pub children: Vec<TransactionLog>,
    #[serde(default)]
    pub events: Vec<TransactionEvent>,
    #[serde(default)]
    pub alarming_transaction: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having_alarming_connection: Option<bool>,
    #[serde(default)]
    pub post_transaction_quires: Vec<String>,
    #[serde(default)]
    pub connection_oriented: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_transaction_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_query_count: Option<u64>,
}

impl TransactionLog {
    /// This transaction plus all nested children.
    pub fn total_transaction_count(&self) -> u64 {
        self.total_transaction_count.unwrap_or_else(|| {
            1 + self.children.iter().map(TransactionLog::total_transaction_count).sum::<u64>()
        })
    }

    /// Queries executed by this transaction and all nested children.
    pub fn total_query_count(&self) -> u64 {
        self.total_query_count.unwrap_or_else(|| {
            self.executed_quires.len() as u64
                + self.children.iter().map(TransactionLog::total_query_count).sum::<u64>()
        })
    }

    /// Healthy means neither the transaction nor its connection usage is alarming.
    pub fn is_healthy(&self) -> bool {
        !self.alarming_transaction && !self.having_alarming_connection.unwrap_or(false)
    }

    /// Display id such as `tx-00042`.
    pub fn display_id(&self) -> Option<String> {
        self.tx_id.map(|id| format!("tx-{:05}", id))
    }

    pub fn thread_name(&self) -> &str {
        self.thread.as_deref().unwrap_or("N/A")
    }
}

/// Connection occupancy record for SQL executed outside a managed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlExecutionLog {
    pub con_acquired_time: DateTime<Utc>,
    pub con_release_time: DateTime<Utc>,
    /// Occupied time in milliseconds.
    pub con_occupied_time: i64,
    #[serde(default)]
    pub thread: Option<String>,
    #[serde(default)]
    pub executed_quires: Vec<String>,
}

/// Aggregate counters served by `/tx-summary`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    #[serde(default)]
    pub committed_count: u64,
    #[serde(default)]
    pub rolled_back_count: u64,
    #[serde(default)]
    pub errored_count: u64,
    #[serde(default)]
    pub total_duration: i64,
    #[serde(default)]
    pub alarming_count: u64,
    #[serde(default)]
    pub connection_acquisition_count: u64,
    #[serde(default)]
    pub total_connection_occupied_time: i64,
    #[serde(default)]
    pub alarming_connection_count: u64,
}

impl TransactionSummary {
    pub fn total_transactions(&self) -> u64 {
        self.committed_count + self.rolled_back_count + self.errored_count
    }

    pub fn average_duration(&self) -> f64 {
        match self.total_transactions() {
            0 => 0.0,
            total => self.total_duration as f64 / total as f64,
        }
    }

    pub fn average_connection_occupied_time(&self) -> f64 {
        match self.connection_acquisition_count {
            0 => 0.0,
            count => self.total_connection_occupied_time as f64 / count as f64,
        }
    }

    /// Percentage of committed transactions, `None` when nothing was recorded.
    pub fn success_rate(&self) -> Option<f64> {
        match self.total_transactions() {
            0 => None,
            total => Some(self.committed_count as f64 / total as f64 * 100.0),
        }
    }

    /// Fold a transaction into the counters.
    pub fn record(&mut self, tx: &TransactionLog) {
        match tx.status {
            TransactionPhaseStatus::Committed => self.committed_count += 1,
            TransactionPhaseStatus::RolledBack => self.rolled_back_count += 1,
            TransactionPhaseStatus::Errored => self.errored_count += 1,
        }
        self.total_duration += tx.duration;
        if tx.alarming_transaction {
            self.alarming_count += 1;
        }
        if let Some(conn) = tx.connection_summary {
            self.connection_acquisition_count += conn.acquisition_count;
            self.total_connection_occupied_time += conn.occupied_time;
            self.alarming_connection_count += conn.alarming_connection_count;
        }
    }
}

/// Half-open duration range `[min_millis, max_millis)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationRange {
    pub min_millis: i64,
    pub max_millis: i64,
}

impl DurationRange {
    pub fn new(min_millis: i64, max_millis: i64) -> Self {
        Self {
            min_millis,
            max_millis,
        }
    }

    pub fn matches(&self, millis: i64) -> bool {
        millis >= self.min_millis && millis < self.max_millis
    }

    /// Axis label such as `100-500ms`.
    pub fn label(&self) -> String {
        format!("{}-{}ms", self.min_millis, self.max_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationDistribution {
    pub range: DurationRange,
    pub count: u64,
}

/// Histogram served by `/tx-charts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionChart {
    #[serde(default)]
    pub duration_distribution: Vec<DurationDistribution>,
}

/// Default histogram bucket upper bounds in milliseconds.
pub const DEFAULT_DURATION_BUCKETS: [i64; 5] = [100, 500, 1000, 2000, 5000];

impl TransactionChart {
    /// Build a histogram over transaction durations.
    ///
    /// `buckets` are ascending upper bounds; durations at or past the last
    /// bound land in an overflow range ending at `i64::MAX`.
    pub fn from_transactions<'a, I>(transactions: I, buckets: &[i64]) -> Self
    where
        I: IntoIterator<Item = &'a TransactionLog>,
    {
        let mut lower = 0;
        let mut distribution: Vec<DurationDistribution> = buckets
            .iter()
            .map(|&upper| {
                let range = DurationRange::new(lower, upper);
                lower = upper;
                DurationDistribution { range, count: 0 }
            })
            .collect();
        distribution.push(DurationDistribution {
            range: DurationRange::new(lower, i64::MAX),
            count: 0,
        });

        for tx in transactions {
            if let Some(bucket) = distribution.iter_mut().find(|d| d.range.matches(tx.duration)) {
                bucket.count += 1;
            }
        }

        Self {
            duration_distribution: distribution,
        }
    }
}

/// A page of results from a paginated endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    /// Zero-based page number.
    #[serde(default, alias = "number")]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<bool>,
}

impl<T> PageResponse<T> {
    pub fn new(content: Vec<T>, page: u32, size: u32, total_elements: u64) -> Self {
        Self {
            content,
            total_elements,
            page,
            size,
            total_pages: None,
            first: None,
            last: None,
        }
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages.unwrap_or_else(|| {
            if self.size == 0 {
                1
            } else {
                self.total_elements.div_ceil(u64::from(self.size)) as u32
            }
        })
    }

    pub fn is_first(&self) -> bool {
        self.first.unwrap_or(self.page == 0)
    }

    pub fn is_last(&self) -> bool {
        self.last.unwrap_or(self.page + 1 >= self.total_pages())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transaction_json() -> &'static str {
        r#"{
            "txId": 42,
            "method": "OrderService.placeOrder",
            "propagation": "REQUIRED",
            "isolation": "DEFAULT",
            "startTime": "2025-03-01T10:00:00Z",
            "endTime": "2025-03-01T10:00:01.500Z",
            "duration": 1500,
            "connectionSummary": {
                "acquisitionCount": 2,
                "alarmingConnectionCount": 1,
                "occupiedTime": 1200
            },
            "status": "COMMITTED",
            "thread": "http-nio-8080-exec-1",
            "executedQuires": ["select * from orders"],
            "child": [{
                "method": "AuditService.log",
                "propagation": "REQUIRES_NEW",
                "isolation": "READ_COMMITTED",
                "startTime": "2025-03-01T10:00:00.100Z",
                "endTime": "2025-03-01T10:00:00.200Z",
                "duration": 100,
                "status": "ROLLED_BACK",
                "thread": "http-nio-8080-exec-1",
                "executedQuires": ["insert into audit values (1)", "select 1"]
            }],
            "events": [
                {"type": "TRANSACTION_START", "timestamp": "2025-03-01T10:00:00Z", "details": "begin"},
                {"type": "SAVEPOINT", "timestamp": "2025-03-01T10:00:00.5Z", "details": "unknown"}
            ],
            "alarmingTransaction": true,
            "havingAlarmingConnection": true,
            "connectionOriented": true
        }"#
    }

    #[test]
    fn test_deserialize_transaction_log() {
        let tx: TransactionLog = serde_json::from_str(sample_transaction_json()).unwrap();
        assert_eq!(tx.tx_id, Some(42));
        assert_eq!(tx.status, TransactionPhaseStatus::Committed);
        assert_eq!(tx.propagation, PropagationBehavior::Required);
        assert_eq!(tx.children.len(), 1);
        assert_eq!(tx.children[0].isolation, IsolationLevel::ReadCommitted);
        assert_eq!(tx.events[1].kind, EventKind::Other);
        assert!(tx.post_transaction_quires.is_empty());
        assert_eq!(tx.display_id().as_deref(), Some("tx-00042"));
        assert!(!tx.is_healthy());
    }

    #[test]
    fn test_recursive_counts_when_missing() {
        let tx: TransactionLog = serde_json::from_str(sample_transaction_json()).unwrap();
        assert_eq!(tx.total_transaction_count(), 2);
        assert_eq!(tx.total_query_count(), 3);
    }

    #[test]
    fn test_unknown_propagation_falls_back() {
        let p: PropagationBehavior = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(p, PropagationBehavior::Unknown);
    }

    #[test]
    fn test_summary_derivations() {
        let summary = TransactionSummary {
            committed_count: 3,
            rolled_back_count: 1,
            errored_count: 0,
            total_duration: 2000,
            connection_acquisition_count: 4,
            total_connection_occupied_time: 100,
            ..Default::default()
        };
        assert_eq!(summary.total_transactions(), 4);
        assert_eq!(summary.average_duration(), 500.0);
        assert_eq!(summary.average_connection_occupied_time(), 25.0);
        assert_eq!(summary.success_rate(), Some(75.0));
    }

    #[test]
    fn test_empty_summary_has_no_success_rate() {
        let summary = TransactionSummary::default();
        assert_eq!(summary.success_rate(), None);
        assert_eq!(summary.average_duration(), 0.0);
    }

    #[test]
    fn test_page_response_derives_paging() {
        let json = r#"{"content": [1, 2], "totalElements": 25, "page": 2, "size": 10}"#;
        let page: PageResponse<u32> = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_pages(), 3);
        assert!(!page.is_first());
        assert!(page.is_last());
    }

    #[test]
    fn test_page_response_accepts_number_alias() {
        let json = r#"{"content": [], "totalElements": 0, "number": 1, "size": 10,
                       "totalPages": 0, "first": false, "last": true}"#;
        let page: PageResponse<u32> = serde_json::from_str(json).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages(), 0);
    }

    #[test]
    fn test_chart_from_transactions() {
        let mut tx: TransactionLog = serde_json::from_str(sample_transaction_json()).unwrap();
        tx.duration = 100;
        let mut slow = tx.clone();
        slow.duration = 9000;

        let chart = TransactionChart::from_transactions([&tx, &slow], &DEFAULT_DURATION_BUCKETS);
        let dist = &chart.duration_distribution;
        assert_eq!(dist.len(), 6);
        assert_eq!(dist[0].count, 0);
        assert_eq!(dist[1].count, 1);
        assert_eq!(dist[5].count, 1);
        assert_eq!(dist[1].range.label(), "100-500ms");
    }
}
