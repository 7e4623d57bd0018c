use crate::error::AnalyticsError;
use crate::report::{AnalyticsBreakdown, AnalyticsResult};
use chrono::{DateTime, Utc};
use core_types::{ItemKind, LedgerItem};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// A stateless calculator for descriptive statistics over item amounts.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsAggregator {}

impl AnalyticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for calculating range analytics.
    ///
    /// # Arguments
    ///
    /// * `items` - Any set of items, in any order. Only those dated within
    ///   `[from, to]` (both inclusive) take part.
    /// * `from`, `to` - The range bounds. `from` must not be after `to`.
    ///
    /// # Returns
    ///
    /// The `AnalyticsResult`, all zeros when no item falls in the range,
    /// `AnalyticsError::InvalidRange` when `from > to`, or
    /// `AnalyticsError::Overflow` when the amounts in range sum past
    /// `Decimal::MAX`.
    pub fn compute(
        &self,
        items: &[LedgerItem],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<AnalyticsResult, AnalyticsError> {
        check_range(from, to)?;
        let amounts = amounts_in_range(items.iter(), from, to);
        summarize(amounts)
    }

    /// Same as [`compute`](Self::compute), but also splits the range by kind.
    pub fn compute_by_kind(
        &self,
        items: &[LedgerItem],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<AnalyticsBreakdown, AnalyticsError> {
        check_range(from, to)?;

        let total = summarize(amounts_in_range(items.iter(), from, to))?;
        let of_kind = |kind: ItemKind| {
            summarize(amounts_in_range(
                items.iter().filter(|item| item.kind == kind),
                from,
                to,
            ))
        };
        let income = of_kind(ItemKind::Income)?;
        let expense = of_kind(ItemKind::Expense)?;

        Ok(AnalyticsBreakdown {
            total,
            income,
            expense,
            // Both sums are non-negative and at most `total.sum`.
            net: income.sum - expense.sum,
        })
    }
}

fn check_range(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<(), AnalyticsError> {
    if from > to {
        return Err(AnalyticsError::InvalidRange { from, to });
    }
    Ok(())
}

fn amounts_in_range<'a>(
    items: impl Iterator<Item = &'a LedgerItem>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<Decimal> {
    items
        .filter(|item| item.date >= from && item.date <= to)
        .map(|item| item.amount)
        .collect()
}

/// Reduces the amounts of one range to its statistics. Takes ownership so
/// the sort happens on a private copy.
fn summarize(mut amounts: Vec<Decimal>) -> Result<AnalyticsResult, AnalyticsError> {
    if amounts.is_empty() {
        return Ok(AnalyticsResult::empty());
    }

    amounts.sort_unstable();

    let count = amounts.len();
    let sum = amounts
        .iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(*amount))
        .ok_or(AnalyticsError::Overflow)?;
    let avg = sum
        .checked_div(Decimal::from(count))
        .ok_or(AnalyticsError::Overflow)?;

    // `None` here can only mean overflow: the slice is non-empty.
    let median = median(&amounts).ok_or(AnalyticsError::Overflow)?;
    let percentile_90 =
        percentile(&amounts, Decimal::new(9, 1)).ok_or(AnalyticsError::Overflow)?;

    tracing::debug!(count, %sum, %median, %percentile_90, "Computed range analytics.");

    Ok(AnalyticsResult {
        sum,
        avg,
        count: count as i64,
        median,
        percentile_90,
    })
}

/// The median of an ascending slice: the middle element for an odd length,
/// the mean of the two middle elements for an even one.
///
/// Returns `None` for an empty slice, or when the middle pair overflows.
pub fn median(sorted: &[Decimal]) -> Option<Decimal> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(sorted[(n - 1) / 2])
    } else {
        sorted[n / 2 - 1]
            .checked_add(sorted[n / 2])?
            .checked_div(Decimal::TWO)
    }
}

/// The `p`-th percentile (`p` in `[0, 1]`) of an ascending slice by linear
/// interpolation.
///
/// The rank is `p * (n - 1)`. An integral rank picks that element; otherwise
/// the result lies between the two neighbouring elements, weighted by the
/// fractional part of the rank.
///
/// Returns `None` for an empty slice, a `p` outside `[0, 1]`, or an
/// interpolation that overflows.
pub fn percentile(sorted: &[Decimal], p: Decimal) -> Option<Decimal> {
    if sorted.is_empty() || p < Decimal::ZERO || p > Decimal::ONE {
        return None;
    }

    let rank = p * Decimal::from(sorted.len() - 1);
    let lower_rank = rank.floor();
    let fraction = rank - lower_rank;
    let lower = lower_rank.to_usize()?;

    if fraction.is_zero() {
        return Some(sorted[lower]);
    }
    let upper = rank.ceil().to_usize()?;
    let spread = sorted[upper].checked_sub(sorted[lower])?;
    sorted[lower].checked_add(fraction.checked_mul(spread)?)
}
