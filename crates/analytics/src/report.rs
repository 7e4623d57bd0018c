use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate statistics over the amounts of the items in a range.
///
/// Serializes to the `/api/analytics` wire format: an object with numeric
/// `sum`, `avg`, `count`, `median` and `percentile_90` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsResult {
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg: Decimal,
    pub count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub median: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub percentile_90: Decimal,
}

impl AnalyticsResult {
    /// The result for a range with no items.
    pub const fn empty() -> Self {
        Self {
            sum: Decimal::ZERO,
            avg: Decimal::ZERO,
            count: 0,
            median: Decimal::ZERO,
            percentile_90: Decimal::ZERO,
        }
    }
}

impl Default for AnalyticsResult {
    fn default() -> Self {
        Self::empty()
    }
}

/// Analytics for a range, overall and split by item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsBreakdown {
    pub total: AnalyticsResult,
    pub income: AnalyticsResult,
    pub expense: AnalyticsResult,
    /// `income.sum - expense.sum`.
    #[serde(with = "rust_decimal::serde::float")]
    pub net: Decimal,
}
