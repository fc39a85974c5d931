//! Admin dashboard state.
//!
//! [`DashboardAggregator`] holds the latest snapshot of the three collections
//! and is the only place that replaces it. [`DashboardSync`] drives it from the
//! poll interval and the change feed.

pub mod aggregator;
pub mod analytics;
pub mod filter;
pub mod notices;
pub mod snapshot;
pub mod sync;

#[cfg(test)]
mod tests;

pub use aggregator::{
    CollectionFailure, DashboardAggregator, DashboardOverview, RefreshOutcome, RefreshReport,
    RefreshTrigger, SkippedRows,
};
pub use analytics::{ContactCounts, DashboardStats, StatusCounts};
pub use filter::{filter_rows, CollectionFilter, Searchable};
pub use notices::{Banner, RecentChanges, Toast, RECENT_CHANGES_CAPACITY};
pub use snapshot::DashboardSnapshot;
pub use sync::DashboardSync;
