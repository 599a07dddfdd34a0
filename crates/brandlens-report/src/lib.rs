//! CSV rendering of analysis results.
//!
//! Formatting only: everything here is derived from [`PeriodResult`] fields;
//! no metric is computed that the aggregator does not already expose, apart
//! from the per-query share columns, which are presentation-level ratios of
//! existing totals.

use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use thiserror::Error;

use brandlens_core::{ClassAggregate, DateRange, PeriodResult, QuerySnapshot};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer error: {0}")]
    Buffer(#[from] std::io::Error),

    #[error("CSV output was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Render the full period export: header, overall metrics, class summary,
/// and the complete per-query listing for both classes.
///
/// # Errors
///
/// Returns [`ReportError`] if the CSV writer fails; with an in-memory buffer
/// that only happens on formatting bugs, not I/O.
pub fn render_period_csv(
    site_url: &str,
    range: &DateRange,
    generated_at: DateTime<Utc>,
    period: &PeriodResult,
) -> Result<String, ReportError> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());

    writer.write_record(["SEO Performance Analysis - Complete Query Data"])?;
    writer.write_record([format!(
        "Generated on: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    )])?;
    writer.write_record([format!("Website: {site_url}")])?;
    writer.write_record([format!("Period: {} to {}", range.start, range.end)])?;
    blank_line(&mut writer)?;

    writer.write_record(["Overall Metrics"])?;
    writer.write_record([
        "Total Clicks (including unattributed)".to_string(),
        period.total_with_unattributed.to_string(),
    ])?;
    writer.write_record([
        "Unattributed Clicks".to_string(),
        period.unattributed_clicks.to_string(),
    ])?;
    writer.write_record([
        "Total Impressions".to_string(),
        period.total_impressions.to_string(),
    ])?;
    writer.write_record([
        "Average CTR".to_string(),
        format!("{:.2}%", overall_ctr(period)),
    ])?;
    writer.write_record([
        "Average Position".to_string(),
        format!("{:.1}", overall_position(period)),
    ])?;
    blank_line(&mut writer)?;

    writer.write_record(["Brand vs Non-Brand Summary"])?;
    writer.write_record([
        "Type",
        "Clicks",
        "Impressions",
        "CTR",
        "Average Position",
        "Share of Voice",
    ])?;
    write_class_summary(&mut writer, "Brand", &period.brand)?;
    write_class_summary(&mut writer, "Non-Brand", &period.non_brand)?;
    writer.write_record([
        "Unattributed".to_string(),
        period.unattributed_clicks.to_string(),
        "N/A".to_string(),
        "N/A".to_string(),
        "N/A".to_string(),
        format!("{:.1}%", period.unattributed_share_pct),
    ])?;
    blank_line(&mut writer)?;

    writer.write_record(["Complete Query Analysis"])?;
    writer.write_record([
        "Type",
        "Query",
        "Clicks",
        "Impressions",
        "CTR",
        "Position",
        "Click Share",
        "Impression Share",
    ])?;
    for query in &period.brand.queries {
        write_query_row(&mut writer, "Brand", query, period)?;
    }
    for query in &period.non_brand.queries {
        write_query_row(&mut writer, "Non-Brand", query, period)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

fn write_class_summary(
    writer: &mut csv::Writer<Vec<u8>>,
    label: &str,
    class: &ClassAggregate,
) -> Result<(), ReportError> {
    writer.write_record([
        label.to_string(),
        class.clicks.to_string(),
        class.impressions.to_string(),
        format!("{:.2}%", class.ctr),
        format!("{:.1}", class.avg_position),
        format!("{:.1}%", class.share_pct),
    ])?;
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn write_query_row(
    writer: &mut csv::Writer<Vec<u8>>,
    label: &str,
    query: &QuerySnapshot,
    period: &PeriodResult,
) -> Result<(), ReportError> {
    let click_share = if period.total_with_unattributed > 0 {
        query.clicks as f64 / period.total_with_unattributed as f64 * 100.0
    } else {
        0.0
    };
    let impression_share = if period.total_impressions > 0 {
        query.impressions as f64 / period.total_impressions as f64 * 100.0
    } else {
        0.0
    };

    writer.write_record([
        label.to_string(),
        query.query.clone(),
        query.clicks.to_string(),
        query.impressions.to_string(),
        format!("{:.2}%", query.ctr),
        format!("{:.1}", query.position),
        format!("{click_share:.2}%"),
        format!("{impression_share:.2}%"),
    ])?;
    Ok(())
}

fn blank_line(writer: &mut csv::Writer<Vec<u8>>) -> Result<(), ReportError> {
    writer.write_record(std::iter::empty::<&[u8]>())?;
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn overall_ctr(period: &PeriodResult) -> f64 {
    let clicks = period.brand.clicks + period.non_brand.clicks;
    if period.total_impressions > 0 {
        clicks as f64 / period.total_impressions as f64 * 100.0
    } else {
        0.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn overall_position(period: &PeriodResult) -> f64 {
    let impressions = period.brand.impressions + period.non_brand.impressions;
    if impressions > 0 {
        (period.brand.position_weighted_sum + period.non_brand.position_weighted_sum)
            / impressions as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandlens_core::{aggregate, BrandPattern, RawQueryRow};
    use chrono::{NaiveDate, TimeZone};

    fn sample_period() -> PeriodResult {
        let rows = vec![
            RawQueryRow {
                query: "mybrand shoes".to_string(),
                clicks: 50,
                impressions: 500,
                ctr: 0.1,
                position: 2.0,
            },
            RawQueryRow {
                query: "running shoes".to_string(),
                clicks: 30,
                impressions: 600,
                ctr: 0.05,
                position: 5.0,
            },
        ];
        let pattern = BrandPattern::compile("mybrand").unwrap();
        aggregate(rows, &pattern, 100)
    }

    fn sample_range() -> DateRange {
        let date = |d| NaiveDate::from_ymd_opt(2026, 7, d).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        DateRange::new(date(1), date(31), today).unwrap()
    }

    fn render() -> String {
        let generated_at = Utc.with_ymd_and_hms(2026, 8, 6, 9, 30, 0).unwrap();
        render_period_csv("example.com", &sample_range(), generated_at, &sample_period())
            .expect("render should succeed")
    }

    #[test]
    fn header_carries_site_and_window() {
        let csv = render();
        assert!(csv.contains("Website: example.com"));
        assert!(csv.contains("Period: 2026-07-01 to 2026-07-31"));
        assert!(csv.contains("Generated on: 2026-08-06 09:30:00"));
    }

    #[test]
    fn summary_rows_cover_both_classes_and_unattributed() {
        let csv = render();
        assert!(csv.contains("Brand,50,500,10.00%,2.0,50.0%"));
        assert!(csv.contains("Non-Brand,30,600,5.00%,5.0,30.0%"));
        assert!(csv.contains("Unattributed,20,N/A,N/A,N/A,20.0%"));
    }

    #[test]
    fn every_query_appears_with_shares() {
        let csv = render();
        // 50 clicks of 100 total, 500 impressions of 1100.
        assert!(csv.contains("Brand,mybrand shoes,50,500,10.00%,2.0,50.00%,45.45%"));
        assert!(csv.contains("Non-Brand,running shoes,30,600,5.00%,5.0,30.00%,54.55%"));
    }

    #[test]
    fn overall_metrics_use_attributed_totals() {
        let csv = render();
        // 80 attributed clicks over 1100 impressions.
        assert!(csv.contains("Average CTR,7.27%"));
        // (2.0*500 + 5.0*600) / 1100 = 3.6
        assert!(csv.contains("Average Position,3.6"));
        assert!(csv.contains("Total Clicks (including unattributed),100"));
    }

    #[test]
    fn output_parses_back_as_flexible_csv() {
        let csv = render();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(csv.as_bytes());
        let records: Vec<csv::StringRecord> =
            reader.records().collect::<Result<_, _>>().expect("valid CSV");
        // 4 header lines + overall block + summary block + query listing.
        assert!(records.len() > 15, "unexpectedly short: {} records", records.len());
    }
}
