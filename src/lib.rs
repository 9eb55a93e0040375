// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # txboard-tui
//!
//! A terminal dashboard and library for transaction and SQL execution logs
//! recorded by a Transaction Log Service.
//!
//! The dashboard pages through transaction logs (with nested child
//! transactions), SQL executed outside transactions, summary counters and
//! a duration histogram. For a single transaction it reconstructs the
//! transaction and connection spans from the recorded lifecycle events and
//! flags spans over the alarming threshold.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │(processing)   │(rendering)   │         │ │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘ │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  ┌─────────┐                                                │
//! │  │ source  │◀── HttpSource | FileSource                     │
//! │  │ (input) │                                                │
//! │  └─────────┘                                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, view navigation, paging and filters
//! - **[`source`]**: Data source abstraction ([`DataSource`] trait) with an
//!   HTTP client for the live service and a JSON dump reader
//! - **[`data`]**: Wire types, query logic, pagination and the timing
//!   reconstruction ([`build_timeline`])
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]**: Layered settings (TOML file, environment)
//! - **[`export`]**: CSV export of transaction pages
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a live service
//! txboard --url http://localhost:8080
//!
//! # Browse a JSON dump, pinning the thresholds
//! txboard --file dump.json --tx-threshold 1s --conn-threshold 500ms
//!
//! # Export the first page and exit
//! txboard --url http://localhost:8080 --export transactions.csv
//! ```
//!
//! ### Reconstructing a timeline
//!
//! ```
//! use txboard_tui::{build_timeline, AlarmingThreshold, TransactionEvent};
//!
//! let events: Vec<TransactionEvent> = serde_json::from_str(r#"[
//!     {"type": "TRANSACTION_START", "timestamp": "2025-03-01T10:00:00Z"},
//!     {"type": "TRANSACTION_END", "timestamp": "2025-03-01T10:00:01.500Z"}
//! ]"#).unwrap();
//!
//! let timeline = build_timeline(&events, &AlarmingThreshold::default());
//! assert_eq!(timeline[1].duration_millis(), Some(1500));
//! assert!(timeline[1].alarming);
//! ```
//!
//! ### As a library with file source
//!
//! ```
//! use txboard_tui::{App, DashboardData, FileSource};
//!
//! let source = Box::new(FileSource::new("dump.json"));
//! let app = App::new(source, DashboardData::default());
//! ```
//!
//! ### As a library with HTTP source
//!
//! ```no_run
//! use std::time::Duration;
//! use txboard_tui::{App, DashboardData, HttpSource, DEFAULT_API_PREFIX};
//!
//! # tokio_test::block_on(async {
//! let source = HttpSource::spawn("http://localhost:8080", DEFAULT_API_PREFIX, Duration::from_secs(10))
//!     .unwrap();
//! let app = App::new(Box::new(source), DashboardData::default());
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod export;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use data::{
    build_timeline, AlarmingThreshold, DashboardData, HealthStatus, PageResponse, SpanOutcome,
    SqlExecutionLog, TimelineEntry, TransactionEvent, TransactionLog, TransactionSummary,
};
pub use source::{
    DataSource, Dump, FetchRequest, FileSource, HttpSource, SourceError, Update,
    DEFAULT_API_PREFIX,
};
