//! Data models and processing for transaction logs.
//!
//! ## Submodules
//!
//! - [`model`]: Wire types served by the Transaction Log Service
//! - [`timeline`]: Interval reconstruction from a transaction's event log
//! - [`query`]: Filter, sort and page requests, applied remotely or locally
//! - [`pagination`]: Page-number strip and record ranges
//! - [`dashboard`]: Last-received state ([`DashboardData`]) and [`HealthStatus`]
//! - [`history`]: Refresh history for sparklines and rate calculations
//! - [`duration`]: Parsing and formatting of durations (e.g., "1s", "750ms")
//!
//! ## Data Flow
//!
//! ```text
//! DataSource::poll() ──▶ Update
//!        │
//!        ▼
//! DashboardData::apply()
//!        │
//!        ├──▶ visible_rows() (expanded transaction tree)
//!        ├──▶ build_timeline() (detail overlay, with the threshold)
//!        └──▶ History::record() (for sparklines)
//! ```

pub mod dashboard;
pub mod duration;
pub mod history;
pub mod model;
pub mod pagination;
pub mod query;
pub mod timeline;

pub use dashboard::{DashboardData, HealthStatus, StatusShare, TransactionRow};
pub use history::History;
pub use model::{
    AlarmingThreshold, EventKind, PageResponse, SqlExecutionLog, TransactionChart,
    TransactionEvent, TransactionLog, TransactionPhaseStatus, TransactionSummary,
};
pub use query::{Direction, Sort, SqlLogQuery, TransactionQuery};
pub use timeline::{build_timeline, SpanOutcome, TimelineEntry};
