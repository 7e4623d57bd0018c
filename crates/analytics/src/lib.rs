//! # Ledger Analytics
//!
//! Descriptive statistics over the amounts of ledger items in a date range:
//! count, sum, mean, median and 90th percentile.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** No I/O and no knowledge of storage. It depends only on
//!   `core-types`; callers hand it a snapshot of items.
//! - **Stateless Calculation:** `AnalyticsAggregator` takes items and a range
//!   and produces an `AnalyticsResult`. The input slice is never mutated.
//!
//! ## Conventions
//!
//! - Both range bounds are inclusive.
//! - An empty range yields an all-zero result rather than an error.
//! - Percentiles use linear interpolation between closest ranks, the same
//!   method as Postgres `PERCENTILE_CONT`.

pub mod engine;
pub mod error;
pub mod report;

pub use engine::{AnalyticsAggregator, median, percentile};
pub use error::AnalyticsError;
pub use report::{AnalyticsBreakdown, AnalyticsResult};
