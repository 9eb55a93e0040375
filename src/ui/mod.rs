//! Terminal UI rendering using ratatui.
//!
//! Each view is implemented in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`transactions`]: Paginated transaction table with expandable children
//! - [`sql_logs`]: Paginated SQL execution logs with a query preview
//! - [`charts`]: Status distribution and duration histogram
//! - [`detail`]: Tabbed overlay for a single transaction, including timing
//! - [`sql`]: Keyword/string/number/comment highlighting for SQL text
//! - [`common`]: Shared components (header, tabs, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (transactions/sql_logs/charts)       │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - detail::render_overlay
//!    - common::render_help
//! ```

pub mod charts;
pub mod common;
pub mod detail;
pub mod sql;
pub mod sql_logs;
pub mod theme;
pub mod transactions;

pub use theme::Theme;
