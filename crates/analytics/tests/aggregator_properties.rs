use analytics::{AnalyticsAggregator, percentile};
use chrono::{DateTime, Duration, TimeZone, Utc};
use core_types::{ItemKind, LedgerItem, NewItem};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Items with cent amounts up to 10,000.00, dated within the first 60 days of 2024.
fn items_strategy() -> impl Strategy<Value = Vec<LedgerItem>> {
    prop::collection::vec((0i64..1_000_000, 0i64..60 * 24, any::<bool>()), 0..60).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (cents, hours, income))| {
                let kind = if income { ItemKind::Income } else { ItemKind::Expense };
                let date = epoch() + Duration::hours(hours);
                let payload = NewItem::new(kind, Decimal::new(cents, 2), "Generated", date);
                LedgerItem::from_new(i as i64 + 1, payload, date)
            })
            .collect()
    })
}

fn range_strategy() -> impl Strategy<Value = (DateTime<Utc>, DateTime<Utc>)> {
    (0i64..60 * 24, 0i64..60 * 24).prop_map(|(a, b)| {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        (epoch() + Duration::hours(lo), epoch() + Duration::hours(hi))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn count_and_sum_match_items_in_range(items in items_strategy(), (from, to) in range_strategy()) {
        let result = AnalyticsAggregator::new().compute(&items, from, to).unwrap();
        let in_range: Vec<&LedgerItem> = items.iter().filter(|i| i.date >= from && i.date <= to).collect();

        prop_assert_eq!(result.count, in_range.len() as i64);
        prop_assert_eq!(result.sum, in_range.iter().map(|i| i.amount).sum::<Decimal>());
        if result.count > 0 {
            prop_assert_eq!(result.avg, result.sum / Decimal::from(result.count));
        }
    }

    #[test]
    fn statistics_ignore_input_order(
        (items, shuffled) in items_strategy()
            .prop_flat_map(|items| (Just(items.clone()), Just(items).prop_shuffle())),
        (from, to) in range_strategy(),
    ) {
        let aggregator = AnalyticsAggregator::new();
        let original = aggregator.compute(&items, from, to).unwrap();
        let permuted = aggregator.compute(&shuffled, from, to).unwrap();

        prop_assert_eq!(original, permuted);
    }

    #[test]
    fn repeated_computation_is_identical(items in items_strategy(), (from, to) in range_strategy()) {
        let aggregator = AnalyticsAggregator::new();
        let snapshot = items.clone();
        let first = aggregator.compute(&items, from, to).unwrap();
        let second = aggregator.compute(&items, from, to).unwrap();

        prop_assert_eq!(first, second);
        prop_assert_eq!(items, snapshot);
    }

    #[test]
    fn percentile_90_is_at_least_the_median(items in items_strategy(), (from, to) in range_strategy()) {
        let result = AnalyticsAggregator::new().compute(&items, from, to).unwrap();
        prop_assert!(result.percentile_90 >= result.median);
    }

    #[test]
    fn percentile_is_monotonic_in_p(
        mut values in prop::collection::vec(0i64..1_000_000, 1..50),
        p1 in 0u32..=100,
        p2 in 0u32..=100,
    ) {
        values.sort_unstable();
        let sorted: Vec<Decimal> = values.into_iter().map(|c| Decimal::new(c, 2)).collect();
        let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };

        let low = percentile(&sorted, Decimal::new(lo as i64, 2)).unwrap();
        let high = percentile(&sorted, Decimal::new(hi as i64, 2)).unwrap();
        prop_assert!(low <= high);
        prop_assert!(low >= sorted[0] && high <= sorted[sorted.len() - 1]);
    }

    #[test]
    fn breakdown_parts_add_up(items in items_strategy(), (from, to) in range_strategy()) {
        let breakdown = AnalyticsAggregator::new().compute_by_kind(&items, from, to).unwrap();
        prop_assert_eq!(breakdown.total.count, breakdown.income.count + breakdown.expense.count);
        prop_assert_eq!(breakdown.total.sum, breakdown.income.sum + breakdown.expense.sum);
    }
}

#[test]
fn point_range_includes_only_exact_instant() {
    let at = epoch() + Duration::hours(5);
    let items: Vec<LedgerItem> = [4, 5, 5, 6]
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let date = epoch() + Duration::hours(*h);
            LedgerItem::from_new(i as i64, NewItem::new(ItemKind::Expense, Decimal::from(10), "x", date), date)
        })
        .collect();

    let result = AnalyticsAggregator::new().compute(&items, at, at).unwrap();
    assert_eq!(result.count, 2);
    assert_eq!(result.sum, Decimal::from(20));
}
