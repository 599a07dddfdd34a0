//! Per-period aggregation of classified query rows.
//!
//! Rows are folded into a two-bucket accumulator; derived ratios (CTR,
//! average position, shares, visibility) are computed once at finalization
//! rather than accumulated incrementally, so rounding never compounds.

use serde::Serialize;

use crate::classify::{BrandPattern, QueryClass};

/// Weight of brand share of voice in the visibility score.
pub const VISIBILITY_SHARE_WEIGHT: f64 = 0.4;
/// Weight of the brand average-position term in the visibility score.
pub const VISIBILITY_POSITION_WEIGHT: f64 = 0.3;
/// Weight of brand CTR in the visibility score.
pub const VISIBILITY_CTR_WEIGHT: f64 = 0.3;
/// Scale applied to the reciprocal of the brand average position.
pub const VISIBILITY_POSITION_SCALE: f64 = 50.0;
/// Dashboard views take this many queries from the top of each ranking.
pub const TOP_QUERIES: usize = 10;

/// One query row as returned by the search-analytics fetch. CTR is the
/// upstream fraction in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQueryRow {
    pub query: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
}

/// A classified query retained in its class bucket. The query text is
/// lowercased on intake and CTR is stored as a percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySnapshot {
    pub query: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
}

/// Totals and derived metrics for one class (brand or non-brand).
///
/// `position_weighted_sum` always equals the sum of
/// `position * impressions` over `queries`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassAggregate {
    pub clicks: u64,
    pub impressions: u64,
    pub position_weighted_sum: f64,
    /// Clicks over impressions, as a percent.
    pub ctr: f64,
    /// Impression-weighted average position; 0 when there are no impressions.
    pub avg_position: f64,
    /// Share of voice: clicks over the period total including unattributed.
    pub share_pct: f64,
    /// Queries ranked by clicks descending; ties keep fetch order.
    pub queries: Vec<QuerySnapshot>,
}

impl ClassAggregate {
    /// Highest-clicks prefix of the ranked query list.
    #[must_use]
    pub fn top_queries(&self, n: usize) -> &[QuerySnapshot] {
        &self.queries[..self.queries.len().min(n)]
    }
}

/// Aggregated metrics for one analysis window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodResult {
    /// Clicks reported by the unfiltered totals query.
    pub total_clicks_reported: u64,
    pub total_impressions: u64,
    /// Gap between the totals query and the per-query sum. Never negative.
    pub unattributed_clicks: u64,
    pub unattributed_share_pct: f64,
    /// Attributed clicks plus the unattributed bucket; the share denominator.
    pub total_with_unattributed: u64,
    /// Composite 0-100 brand visibility score.
    pub visibility_score: f64,
    pub brand: ClassAggregate,
    pub non_brand: ClassAggregate,
}

#[derive(Debug, Default)]
struct ClassAccumulator {
    clicks: u64,
    impressions: u64,
    position_weighted_sum: f64,
    queries: Vec<QuerySnapshot>,
}

impl ClassAccumulator {
    #[allow(clippy::cast_precision_loss)]
    fn fold(mut self, snapshot: QuerySnapshot) -> Self {
        self.clicks += snapshot.clicks;
        self.impressions += snapshot.impressions;
        self.position_weighted_sum += snapshot.position * snapshot.impressions as f64;
        self.queries.push(snapshot);
        self
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(mut self, total_with_unattributed: u64) -> ClassAggregate {
        // sort_by is stable, so equal-clicks queries keep fetch order.
        self.queries.sort_by(|a, b| b.clicks.cmp(&a.clicks));

        let ctr = if self.impressions > 0 {
            self.clicks as f64 / self.impressions as f64 * 100.0
        } else {
            0.0
        };
        let avg_position = if self.impressions > 0 {
            self.position_weighted_sum / self.impressions as f64
        } else {
            0.0
        };
        let share_pct = if total_with_unattributed > 0 {
            self.clicks as f64 / total_with_unattributed as f64 * 100.0
        } else {
            0.0
        };

        ClassAggregate {
            clicks: self.clicks,
            impressions: self.impressions,
            position_weighted_sum: self.position_weighted_sum,
            ctr,
            avg_position,
            share_pct,
            queries: self.queries,
        }
    }
}

#[derive(Debug, Default)]
struct PeriodAccumulator {
    brand: ClassAccumulator,
    non_brand: ClassAccumulator,
    total_impressions: u64,
}

impl PeriodAccumulator {
    fn fold(mut self, pattern: &BrandPattern, row: RawQueryRow) -> Self {
        let snapshot = QuerySnapshot {
            query: row.query.to_lowercase(),
            clicks: row.clicks,
            impressions: row.impressions,
            ctr: row.ctr * 100.0,
            position: row.position,
        };
        self.total_impressions += snapshot.impressions;
        match pattern.classify(&snapshot.query) {
            QueryClass::Brand => self.brand = self.brand.fold(snapshot),
            QueryClass::NonBrand => self.non_brand = self.non_brand.fold(snapshot),
        }
        self
    }
}

/// Fold a period's rows into a [`PeriodResult`].
///
/// `total_clicks_reported` comes from the separate no-dimension totals query;
/// when it exceeds the per-query sum, the difference is reported as
/// unattributed clicks, clamped at zero when the data skews the other way.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(
    rows: Vec<RawQueryRow>,
    pattern: &BrandPattern,
    total_clicks_reported: u64,
) -> PeriodResult {
    let acc = rows
        .into_iter()
        .fold(PeriodAccumulator::default(), |acc, row| acc.fold(pattern, row));

    let attributed = acc.brand.clicks + acc.non_brand.clicks;
    let unattributed_clicks = total_clicks_reported.saturating_sub(attributed);
    let total_with_unattributed = attributed + unattributed_clicks;

    let brand = acc.brand.finish(total_with_unattributed);
    let non_brand = acc.non_brand.finish(total_with_unattributed);

    let unattributed_share_pct = if total_with_unattributed > 0 {
        unattributed_clicks as f64 / total_with_unattributed as f64 * 100.0
    } else {
        0.0
    };

    let visibility_score = visibility_score(&brand);

    PeriodResult {
        total_clicks_reported,
        total_impressions: acc.total_impressions,
        unattributed_clicks,
        unattributed_share_pct,
        total_with_unattributed,
        visibility_score,
        brand,
        non_brand,
    }
}

/// Blend of brand share, average position, and CTR, clamped to 0-100.
///
/// Zero when the brand bucket has no position signal; the guard also keeps
/// the reciprocal-position term away from division by zero.
fn visibility_score(brand: &ClassAggregate) -> f64 {
    if brand.avg_position <= 0.0 {
        return 0.0;
    }
    let position_term = (1.0 / brand.avg_position * VISIBILITY_POSITION_SCALE).min(100.0);
    let score = brand.share_pct * VISIBILITY_SHARE_WEIGHT
        + position_term * VISIBILITY_POSITION_WEIGHT
        + brand.ctr.min(100.0) * VISIBILITY_CTR_WEIGHT;
    score.clamp(0.0, 100.0)
}
