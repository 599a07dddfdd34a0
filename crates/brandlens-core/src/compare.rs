//! Period-over-period comparison: class-level deltas plus a ranked list of
//! significant per-query movers.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::aggregate::{ClassAggregate, PeriodResult, QuerySnapshot};

/// A query delta counts as significant above this absolute click change.
pub const CLICKS_CHANGE_THRESHOLD_PCT: f64 = 10.0;
/// Or above this absolute position shift.
pub const POSITION_CHANGE_THRESHOLD: f64 = 0.5;
/// Upper bound on the ranked query-delta list.
pub const MAX_QUERY_CHANGES: usize = 100;

/// Class-level movement between two periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassChange {
    pub clicks_change_pct: f64,
    pub ctr_change_pct: f64,
    /// Previous minus current average position: positive means the class
    /// moved up the rankings.
    pub position_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassChanges {
    pub brand: ClassChange,
    pub non_brand: ClassChange,
}

/// One significant per-query mover.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDelta {
    pub query: String,
    pub clicks_change_pct: f64,
    pub position_change: f64,
    pub current: QuerySnapshot,
    pub previous: QuerySnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub current: PeriodResult,
    pub previous: PeriodResult,
    pub class_changes: ClassChanges,
    /// At most [`MAX_QUERY_CHANGES`] deltas, ranked by absolute click change.
    pub query_changes: Vec<QueryDelta>,
}

/// Percentage change with the zero-baseline convention: any growth from zero
/// reports as 100%, no movement from zero as 0%.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn pct_change(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        if new > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (new - old) / old * 100.0
    }
}

/// Compare two fully materialized periods.
///
/// A query present in only one period is treated as a full appearance or
/// disappearance, not an error; the missing side defaults to a zero snapshot.
#[must_use]
pub fn compare(previous: PeriodResult, current: PeriodResult) -> ComparisonResult {
    let class_changes = ClassChanges {
        brand: class_change(&previous.brand, &current.brand),
        non_brand: class_change(&previous.non_brand, &current.non_brand),
    };
    let query_changes = query_changes(&previous, &current);

    ComparisonResult {
        current,
        previous,
        class_changes,
        query_changes,
    }
}

#[allow(clippy::cast_precision_loss)]
fn class_change(previous: &ClassAggregate, current: &ClassAggregate) -> ClassChange {
    ClassChange {
        clicks_change_pct: pct_change(previous.clicks as f64, current.clicks as f64),
        ctr_change_pct: pct_change(previous.ctr, current.ctr),
        position_change: previous.avg_position - current.avg_position,
    }
}

/// Both classes' query lists of one period, keyed by the query text (already
/// lowercased by the aggregator).
fn snapshot_index(period: &PeriodResult) -> HashMap<&str, &QuerySnapshot> {
    period
        .brand
        .queries
        .iter()
        .chain(period.non_brand.queries.iter())
        .map(|q| (q.query.as_str(), q))
        .collect()
}

#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
fn query_changes(previous: &PeriodResult, current: &PeriodResult) -> Vec<QueryDelta> {
    let prev_index = snapshot_index(previous);
    let curr_index = snapshot_index(current);

    // Union in lexical order so equal-magnitude deltas rank deterministically.
    let union: BTreeSet<&str> = prev_index.keys().chain(curr_index.keys()).copied().collect();

    let mut deltas: Vec<QueryDelta> = union
        .into_iter()
        .filter_map(|query| {
            let prev = prev_index.get(query).copied();
            let curr = curr_index.get(query).copied();
            let prev = prev.cloned().unwrap_or_else(|| zero_snapshot(query));
            let curr = curr.cloned().unwrap_or_else(|| zero_snapshot(query));

            let clicks_change_pct = pct_change(prev.clicks as f64, curr.clicks as f64);
            let position_change = if prev.position != 0.0 && curr.position != 0.0 {
                prev.position - curr.position
            } else {
                0.0
            };

            let significant = clicks_change_pct.abs() > CLICKS_CHANGE_THRESHOLD_PCT
                || position_change.abs() > POSITION_CHANGE_THRESHOLD;
            significant.then(|| QueryDelta {
                query: query.to_string(),
                clicks_change_pct,
                position_change,
                current: curr,
                previous: prev,
            })
        })
        .collect();

    deltas.sort_by(|a, b| {
        b.clicks_change_pct
            .abs()
            .total_cmp(&a.clicks_change_pct.abs())
    });
    deltas.truncate(MAX_QUERY_CHANGES);
    deltas
}

fn zero_snapshot(query: &str) -> QuerySnapshot {
    QuerySnapshot {
        query: query.to_string(),
        clicks: 0,
        impressions: 0,
        ctr: 0.0,
        position: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, RawQueryRow};
    use crate::classify::BrandPattern;

    fn row(query: &str, clicks: u64, impressions: u64, position: f64) -> RawQueryRow {
        RawQueryRow {
            query: query.to_string(),
            clicks,
            impressions,
            ctr: if impressions > 0 {
                clicks as f64 / impressions as f64
            } else {
                0.0
            },
            position,
        }
    }

    fn period(rows: Vec<RawQueryRow>, totals: u64) -> PeriodResult {
        let pattern = BrandPattern::compile("mybrand").unwrap();
        aggregate(rows, &pattern, totals)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn pct_change_zero_baseline_convention() {
        assert_close(pct_change(0.0, 0.0), 0.0);
        assert_close(pct_change(0.0, 5.0), 100.0);
        assert_close(pct_change(10.0, 5.0), -50.0);
        assert_close(pct_change(10.0, 15.0), 50.0);
    }

    #[test]
    fn comparing_a_period_with_itself_is_all_zero() {
        let make = || {
            period(
                vec![
                    row("mybrand shoes", 50, 500, 2.0),
                    row("running shoes", 30, 600, 5.0),
                ],
                80,
            )
        };
        let result = compare(make(), make());

        assert_close(result.class_changes.brand.clicks_change_pct, 0.0);
        assert_close(result.class_changes.brand.ctr_change_pct, 0.0);
        assert_close(result.class_changes.brand.position_change, 0.0);
        assert_close(result.class_changes.non_brand.clicks_change_pct, 0.0);
        assert!(result.query_changes.is_empty());
    }

    #[test]
    fn class_deltas_follow_the_convention() {
        let previous = period(vec![row("mybrand shoes", 50, 500, 3.0)], 50);
        let current = period(vec![row("mybrand shoes", 75, 500, 2.0)], 75);
        let result = compare(previous, current);

        assert_close(result.class_changes.brand.clicks_change_pct, 50.0);
        // CTR moved from 10% to 15%.
        assert_close(result.class_changes.brand.ctr_change_pct, 50.0);
        // Lower position is better, so 3.0 -> 2.0 reports +1.0.
        assert_close(result.class_changes.brand.position_change, 1.0);
        // Non-brand was empty in both periods.
        assert_close(result.class_changes.non_brand.clicks_change_pct, 0.0);
    }

    #[test]
    fn small_click_movement_is_filtered_out() {
        let previous = period(vec![row("running shoes", 100, 1000, 4.0)], 100);
        let current = period(vec![row("running shoes", 105, 1000, 4.0)], 105);
        let result = compare(previous, current);
        assert!(result.query_changes.is_empty());
    }

    #[test]
    fn click_movement_over_threshold_is_kept() {
        let previous = period(vec![row("running shoes", 100, 1000, 4.0)], 100);
        let current = period(vec![row("running shoes", 115, 1000, 4.0)], 115);
        let result = compare(previous, current);

        assert_eq!(result.query_changes.len(), 1);
        let delta = &result.query_changes[0];
        assert_eq!(delta.query, "running shoes");
        assert_close(delta.clicks_change_pct, 15.0);
    }

    #[test]
    fn position_shift_alone_is_significant() {
        let previous = period(vec![row("running shoes", 100, 1000, 4.0)], 100);
        let current = period(vec![row("running shoes", 100, 1000, 3.2)], 100);
        let result = compare(previous, current);

        assert_eq!(result.query_changes.len(), 1);
        assert_close(result.query_changes[0].position_change, 0.8);
        assert_close(result.query_changes[0].clicks_change_pct, 0.0);
    }

    #[test]
    fn missing_position_signal_reports_no_position_change() {
        // The query is new in the current period, so the previous snapshot
        // defaults to zero and position change must stay 0.
        let previous = period(Vec::new(), 0);
        let current = period(vec![row("new query", 20, 200, 2.0)], 20);
        let result = compare(previous, current);

        assert_eq!(result.query_changes.len(), 1);
        let delta = &result.query_changes[0];
        assert_close(delta.clicks_change_pct, 100.0);
        assert_close(delta.position_change, 0.0);
        assert_eq!(delta.previous.clicks, 0);
        assert_eq!(delta.previous.query, "new query");
    }

    #[test]
    fn disappearing_query_reports_a_drop() {
        let previous = period(vec![row("old query", 40, 400, 3.0)], 40);
        let current = period(Vec::new(), 0);
        let result = compare(previous, current);

        assert_eq!(result.query_changes.len(), 1);
        assert_close(result.query_changes[0].clicks_change_pct, -100.0);
        assert_eq!(result.query_changes[0].current.clicks, 0);
    }

    #[test]
    fn deltas_rank_by_absolute_click_change() {
        let previous = period(
            vec![
                row("steady riser", 100, 1000, 4.0),
                row("big faller", 100, 1000, 4.0),
                row("mild mover", 100, 1000, 4.0),
            ],
            300,
        );
        let current = period(
            vec![
                row("steady riser", 150, 1000, 4.0),
                row("big faller", 20, 1000, 4.0),
                row("mild mover", 112, 1000, 4.0),
            ],
            282,
        );
        let result = compare(previous, current);

        let order: Vec<&str> = result
            .query_changes
            .iter()
            .map(|d| d.query.as_str())
            .collect();
        assert_eq!(order, vec!["big faller", "steady riser", "mild mover"]);
    }

    #[test]
    fn query_changes_cap_at_one_hundred() {
        let make_rows = |clicks: u64| -> Vec<RawQueryRow> {
            (0..150)
                .map(|i| row(&format!("query {i:03}"), clicks + i, 1000, 4.0))
                .collect()
        };
        // Every query doubles its clicks, so all 150 deltas are significant.
        let previous = period(make_rows(100), 0);
        let current = period(
            (0..150)
                .map(|i| row(&format!("query {i:03}"), (100 + i) * 2, 1000, 4.0))
                .collect(),
            0,
        );
        let result = compare(previous, current);

        assert_eq!(result.query_changes.len(), MAX_QUERY_CHANGES);
        // 100% for every delta; the cap keeps the largest absolute changes,
        // which are all equal here, so just confirm the bound and magnitude.
        assert!(result
            .query_changes
            .iter()
            .all(|d| (d.clicks_change_pct - 100.0).abs() < 1e-9));
    }

    #[test]
    fn union_spans_both_classes() {
        let previous = period(
            vec![
                row("mybrand shoes", 50, 500, 2.0),
                row("running shoes", 100, 1000, 4.0),
            ],
            150,
        );
        let current = period(
            vec![
                row("mybrand shoes", 80, 500, 2.0),
                row("running shoes", 100, 1000, 4.0),
            ],
            180,
        );
        let result = compare(previous, current);

        assert_eq!(result.query_changes.len(), 1);
        assert_eq!(result.query_changes[0].query, "mybrand shoes");
        assert_close(result.query_changes[0].clicks_change_pct, 60.0);
    }
}
