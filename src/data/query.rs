//! Page requests for the paginated endpoints.
//!
//! A query is turned into HTTP parameters for the Transaction Log Service,
//! or applied locally (filter, sort, slice) when browsing an offline dump.

use std::cmp::Ordering;

use super::model::{
    IsolationLevel, PageResponse, PropagationBehavior, SqlExecutionLog, TransactionLog,
    TransactionPhaseStatus,
};
use crate::source::SourceError;

/// Largest page size the service accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Page sizes offered in the UI.
pub const PAGE_SIZES: [u32; 4] = [10, 25, 50, 100];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Sort order as `property,direction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub property: String,
    pub direction: Direction,
}

impl Sort {
    pub fn new(property: impl Into<String>, direction: Direction) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }

    /// Parse `"startTime,desc"`. Unknown directions fall back to ascending.
    pub fn parse(value: &str) -> Result<Self, SourceError> {
        let parts: Vec<&str> = value.split(',').collect();
        let [property, direction] = parts.as_slice() else {
            return Err(SourceError::InvalidQuery(format!(
                "can't extract property and sort direction from: {}",
                value
            )));
        };
        let property = property.trim();
        if property.is_empty() {
            return Err(SourceError::InvalidQuery(
                "the sort property must not be blank".to_string(),
            ));
        }
        let direction = if direction.trim().eq_ignore_ascii_case("desc") {
            Direction::Desc
        } else {
            Direction::Asc
        };
        Ok(Self::new(property, direction))
    }

    /// Select a column: same column flips direction, a new one starts ascending.
    pub fn toggled(current: Option<&Sort>, property: &str) -> Sort {
        match current {
            Some(sort) if sort.property == property => {
                Sort::new(property, sort.direction.reverse())
            }
            _ => Sort::new(property, Direction::Asc),
        }
    }

    pub fn to_param(&self) -> String {
        format!("{},{}", self.property, self.direction.as_str())
    }
}

/// Request for one page of transaction logs.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    /// Zero-based page number.
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
    pub search: String,
    pub status: Option<TransactionPhaseStatus>,
    pub propagation: Option<PropagationBehavior>,
    pub isolation: Option<IsolationLevel>,
    pub connection_oriented: Option<bool>,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: PAGE_SIZES[0],
            sort: Some(Sort::new("startTime", Direction::Desc)),
            search: String::new(),
            status: None,
            propagation: None,
            isolation: None,
            connection_oriented: None,
        }
    }
}

impl TransactionQuery {
    pub fn validate(&self) -> Result<(), SourceError> {
        validate_size(self.size)
    }

    /// Whether any filter narrows the result set.
    pub fn is_filtered(&self) -> bool {
        !self.search.trim().is_empty()
            || self.status.is_some()
            || self.propagation.is_some()
            || self.isolation.is_some()
            || self.connection_oriented.is_some()
    }

    pub fn clear_filters(&mut self) {
        self.search.clear();
        self.status = None;
        self.propagation = None;
        self.isolation = None;
        self.connection_oriented = None;
        self.page = 0;
    }

    /// Query string parameters; blank filters are omitted.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(propagation) = self.propagation {
            params.push(("propagation", propagation.as_str().to_string()));
        }
        if let Some(isolation) = self.isolation {
            params.push(("isolation", isolation.as_str().to_string()));
        }
        if let Some(connection_oriented) = self.connection_oriented {
            params.push(("connectionOriented", connection_oriented.to_string()));
        }
        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search", search.to_lowercase()));
        }
        if let Some(ref sort) = self.sort {
            params.push(("sort", sort.to_param()));
        }
        params
    }

    pub fn matches(&self, tx: &TransactionLog) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() {
            let in_method = tx.method.to_lowercase().contains(&search);
            let in_thread = tx.thread.as_deref().is_some_and(|t| t.to_lowercase().contains(&search));
            if !in_method && !in_thread {
                return false;
            }
        }
        self.status.is_none_or(|s| s == tx.status)
            && self.propagation.is_none_or(|p| p == tx.propagation)
            && self.isolation.is_none_or(|i| i == tx.isolation)
            && self.connection_oriented.is_none_or(|c| c == tx.connection_oriented)
    }

    /// Filter, sort and slice an in-memory list of transactions.
    pub fn apply(&self, transactions: &[TransactionLog]) -> PageResponse<TransactionLog> {
        let mut matched: Vec<&TransactionLog> =
            transactions.iter().filter(|tx| self.matches(tx)).collect();
        if let Some(ref sort) = self.sort {
            if let Some(cmp) = transaction_comparator(&sort.property) {
                matched.sort_by(|a, b| sort.direction.apply(cmp(a, b)));
            }
        }
        paginate(matched, self.page, self.size)
    }
}

/// Request for one page of SQL execution logs.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlLogQuery {
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
    /// Matched against the thread name.
    pub search: String,
}

impl Default for SqlLogQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: PAGE_SIZES[0],
            sort: Some(Sort::new("conAcquiredTime", Direction::Desc)),
            search: String::new(),
        }
    }
}

impl SqlLogQuery {
    pub fn validate(&self) -> Result<(), SourceError> {
        validate_size(self.size)
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search", search.to_lowercase()));
        }
        if let Some(ref sort) = self.sort {
            params.push(("sort", sort.to_param()));
        }
        params
    }

    pub fn matches(&self, log: &SqlExecutionLog) -> bool {
        let search = self.search.trim().to_lowercase();
        search.is_empty()
            || log.thread.as_deref().is_some_and(|t| t.to_lowercase().contains(&search))
    }

    pub fn apply(&self, logs: &[SqlExecutionLog]) -> PageResponse<SqlExecutionLog> {
        let mut matched: Vec<&SqlExecutionLog> = logs.iter().filter(|l| self.matches(l)).collect();
        if let Some(ref sort) = self.sort {
            if let Some(cmp) = sql_log_comparator(&sort.property) {
                matched.sort_by(|a, b| sort.direction.apply(cmp(a, b)));
            }
        }
        paginate(matched, self.page, self.size)
    }
}

fn validate_size(size: u32) -> Result<(), SourceError> {
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(SourceError::InvalidQuery(format!(
            "the value of 'size' must be between 1 to {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(())
}

type Comparator<T> = fn(&T, &T) -> Ordering;

fn transaction_comparator(property: &str) -> Option<Comparator<TransactionLog>> {
    let cmp: Comparator<TransactionLog> = match property {
        "startTime" => |a, b| a.start_time.cmp(&b.start_time),
        "endTime" => |a, b| a.end_time.cmp(&b.end_time),
        "duration" => |a, b| a.duration.cmp(&b.duration),
        "method" => |a, b| a.method.cmp(&b.method),
        "thread" => |a, b| a.thread.cmp(&b.thread),
        "status" => |a, b| a.status.cmp(&b.status),
        "propagation" => |a, b| a.propagation.cmp(&b.propagation),
        "isolation" => |a, b| a.isolation.cmp(&b.isolation),
        _ => return None,
    };
    Some(cmp)
}

fn sql_log_comparator(property: &str) -> Option<Comparator<SqlExecutionLog>> {
    let cmp: Comparator<SqlExecutionLog> = match property {
        "conAcquiredTime" => |a, b| a.con_acquired_time.cmp(&b.con_acquired_time),
        "conReleaseTime" => |a, b| a.con_release_time.cmp(&b.con_release_time),
        "conOccupiedTime" => |a, b| a.con_occupied_time.cmp(&b.con_occupied_time),
        "thread" => |a, b| a.thread.cmp(&b.thread),
        _ => return None,
    };
    Some(cmp)
}

fn paginate<T: Clone>(matched: Vec<&T>, page: u32, size: u32) -> PageResponse<T> {
    let total = matched.len() as u64;
    let start = (page as usize).saturating_mul(size as usize);
    let content = matched.into_iter().skip(start).take(size as usize).cloned().collect();
    PageResponse::new(content, page, size, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tx(method: &str, thread: &str, duration: i64, status: TransactionPhaseStatus) -> TransactionLog {
        let start = Utc.timestamp_millis_opt(1_700_000_000_000 + duration * 10).unwrap();
        TransactionLog {
            tx_id: None,
            method: method.to_string(),
            propagation: PropagationBehavior::Required,
            isolation: IsolationLevel::Default,
            start_time: start,
            end_time: start + chrono::Duration::milliseconds(duration),
            duration,
            connection_summary: None,
            status,
            thread: Some(thread.to_string()),
            executed_quires: Vec::new(),
            children: Vec::new(),
            events: Vec::new(),
            alarming_transaction: false,
            having_alarming_connection: None,
            post_transaction_quires: Vec::new(),
            connection_oriented: false,
            total_transaction_count: None,
            total_query_count: None,
        }
    }

    fn sample() -> Vec<TransactionLog> {
        vec![
            tx("OrderService.place", "exec-1", 300, TransactionPhaseStatus::Committed),
            tx("UserService.create", "exec-2", 100, TransactionPhaseStatus::RolledBack),
            tx("OrderService.cancel", "worker-3", 200, TransactionPhaseStatus::Committed),
        ]
    }

    #[test]
    fn test_sort_parse() {
        let sort = Sort::parse("duration, DESC").unwrap();
        assert_eq!(sort.property, "duration");
        assert_eq!(sort.direction, Direction::Desc);

        let sort = Sort::parse("method,sideways").unwrap();
        assert_eq!(sort.direction, Direction::Asc);

        assert!(Sort::parse("duration").is_err());
        assert!(Sort::parse(" ,asc").is_err());
        assert!(Sort::parse("a,b,c").is_err());
    }

    #[test]
    fn test_sort_toggle() {
        let current = Sort::new("duration", Direction::Asc);
        assert_eq!(Sort::toggled(Some(&current), "duration").direction, Direction::Desc);
        let other = Sort::toggled(Some(&current), "method");
        assert_eq!(other, Sort::new("method", Direction::Asc));
    }

    #[test]
    fn test_validate_size() {
        let mut query = TransactionQuery::default();
        assert!(query.validate().is_ok());
        query.size = 0;
        assert!(query.validate().is_err());
        query.size = 1001;
        assert!(query.validate().is_err());
        query.size = 1000;
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_query_pairs_omit_blank_filters() {
        let query = TransactionQuery {
            search: "   ".to_string(),
            ..Default::default()
        };
        let params = query.to_query_pairs();
        assert_eq!(
            params,
            vec![
                ("page", "0".to_string()),
                ("size", "10".to_string()),
                ("sort", "startTime,desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_include_filters() {
        let query = TransactionQuery {
            page: 2,
            size: 25,
            sort: None,
            search: "OrderService".to_string(),
            status: Some(TransactionPhaseStatus::RolledBack),
            propagation: Some(PropagationBehavior::RequiresNew),
            isolation: Some(IsolationLevel::Serializable),
            connection_oriented: Some(true),
        };
        let params = query.to_query_pairs();
        assert!(params.contains(&("status", "ROLLED_BACK".to_string())));
        assert!(params.contains(&("propagation", "REQUIRES_NEW".to_string())));
        assert!(params.contains(&("isolation", "SERIALIZABLE".to_string())));
        assert!(params.contains(&("connectionOriented", "true".to_string())));
        assert!(params.contains(&("search", "orderservice".to_string())));
        assert!(params.contains(&("page", "2".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "sort"));
    }

    #[test]
    fn test_apply_search_matches_method_or_thread() {
        let query = TransactionQuery {
            search: "WORKER".to_string(),
            ..Default::default()
        };
        let page = query.apply(&sample());
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].method, "OrderService.cancel");

        let query = TransactionQuery {
            search: "orderservice".to_string(),
            ..Default::default()
        };
        assert_eq!(query.apply(&sample()).total_elements, 2);
    }

    #[test]
    fn test_apply_filters_are_anded() {
        let query = TransactionQuery {
            search: "order".to_string(),
            status: Some(TransactionPhaseStatus::RolledBack),
            ..Default::default()
        };
        assert_eq!(query.apply(&sample()).total_elements, 0);
    }

    #[test]
    fn test_apply_sort_and_slice() {
        let query = TransactionQuery {
            size: 2,
            sort: Some(Sort::new("duration", Direction::Asc)),
            ..Default::default()
        };
        let page = query.apply(&sample());
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages(), 2);
        let durations: Vec<i64> = page.content.iter().map(|t| t.duration).collect();
        assert_eq!(durations, vec![100, 200]);

        let second = TransactionQuery { page: 1, ..query.clone() }.apply(&sample());
        assert_eq!(second.content.len(), 1);
        assert_eq!(second.content[0].duration, 300);
        assert!(second.is_last());
    }

    #[test]
    fn test_apply_page_past_end_is_empty() {
        let query = TransactionQuery {
            page: 9,
            ..Default::default()
        };
        let page = query.apply(&sample());
        assert!(page.content.is_empty());
        assert_eq!(page.total_elements, 3);
    }

    #[test]
    fn test_sort_unknown_and_default_first() {
        let mut transactions = sample();
        transactions[0].propagation = PropagationBehavior::Nested;
        transactions[1].propagation = PropagationBehavior::Unknown;
        transactions[0].isolation = IsolationLevel::Serializable;
        transactions[2].isolation = IsolationLevel::ReadCommitted;

        let by = |property: &str| {
            let query = TransactionQuery {
                sort: Some(Sort::new(property, Direction::Asc)),
                ..Default::default()
            };
            query
                .apply(&transactions)
                .content
                .into_iter()
                .map(|t| t.method)
                .collect::<Vec<_>>()
        };

        assert_eq!(
            by("propagation"),
            vec!["UserService.create", "OrderService.cancel", "OrderService.place"]
        );
        assert_eq!(
            by("isolation"),
            vec!["UserService.create", "OrderService.cancel", "OrderService.place"]
        );
    }

    #[test]
    fn test_unknown_sort_property_keeps_order() {
        let query = TransactionQuery {
            sort: Some(Sort::new("nope", Direction::Desc)),
            ..Default::default()
        };
        let methods: Vec<String> = query.apply(&sample()).content.into_iter().map(|t| t.method).collect();
        assert_eq!(methods[0], "OrderService.place");
        assert_eq!(methods[2], "OrderService.cancel");
    }

    #[test]
    fn test_clear_filters_resets_page() {
        let mut query = TransactionQuery {
            page: 3,
            search: "x".to_string(),
            status: Some(TransactionPhaseStatus::Errored),
            ..Default::default()
        };
        assert!(query.is_filtered());
        query.clear_filters();
        assert!(!query.is_filtered());
        assert_eq!(query.page, 0);
    }
}
