//! Longitudinal views over stored screening results: month/tier aggregation for charts, the
//! admin overview, a user's own journey, and CSV import of exported results.

mod aggregate;
mod import;
mod live;
pub mod views;

pub use aggregate::{aggregate, aggregate_in, HistoryAggregate, MonthKey, MonthlyBucket, TierTotals};
pub use import::{HistoryImportError, ScreeningHistoryImporter};
pub use live::{FeedStatus, LiveDashboard};
pub use views::{AdminOverview, TierShare, TrendPoint, UserJourney};
