use chrono::Utc;
use clap::Args;

use brandlens_core::{aggregate, BrandPattern, ComparisonResult, DateRange};
use brandlens_gsc::fetch_period;

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Site to analyze (domain, URL, or sc-domain: identifier)
    #[arg(long)]
    pub site: String,

    /// Current window start, YYYY-MM-DD
    #[arg(long)]
    pub current_start: String,

    /// Current window end, YYYY-MM-DD
    #[arg(long)]
    pub current_end: String,

    /// Previous window start, YYYY-MM-DD
    #[arg(long)]
    pub previous_start: String,

    /// Previous window end, YYYY-MM-DD
    #[arg(long)]
    pub previous_end: String,

    /// `|`-separated brand keywords; empty treats every query as non-brand
    #[arg(long, default_value = "")]
    pub pattern: String,

    /// OAuth bearer token with the webmasters.readonly scope
    #[arg(long, env = "GSC_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// How many of the ranked query movers to print
    #[arg(long, default_value_t = 10)]
    pub movers: usize,
}

pub async fn run(args: CompareArgs, timeout_secs: u64) -> anyhow::Result<()> {
    let pattern = BrandPattern::compile(&args.pattern)?;
    let today = Utc::now().date_naive();
    let current_range = DateRange::parse(&args.current_start, &args.current_end, today)?;
    let previous_range = DateRange::parse(&args.previous_start, &args.previous_end, today)?;

    let (client, property) =
        super::connect_and_resolve(&args.access_token, &args.site, timeout_secs).await?;

    // Independent windows; fetch them concurrently.
    let (current_fetch, previous_fetch) = tokio::try_join!(
        fetch_period(&client, &property, &current_range),
        fetch_period(&client, &property, &previous_range),
    )?;

    let current = aggregate(
        current_fetch.rows,
        &pattern,
        current_fetch.total_clicks_reported,
    );
    let previous = aggregate(
        previous_fetch.rows,
        &pattern,
        previous_fetch.total_clicks_reported,
    );
    let result = brandlens_core::compare(previous, current);

    print_comparison(&args.site, &current_range, &previous_range, &result, args.movers);
    Ok(())
}

fn print_comparison(
    site: &str,
    current: &DateRange,
    previous: &DateRange,
    result: &ComparisonResult,
    movers: usize,
) {
    println!(
        "Period comparison for {site}: {} to {} vs {} to {}",
        current.start, current.end, previous.start, previous.end
    );
    println!();

    for (label, change) in [
        ("Brand", &result.class_changes.brand),
        ("Non-brand", &result.class_changes.non_brand),
    ] {
        println!(
            "{label}: clicks {:+.1}%, CTR {:+.1}%, position {:+.2}",
            change.clicks_change_pct, change.ctr_change_pct, change.position_change
        );
    }

    println!();
    if result.query_changes.is_empty() {
        println!("No significant query movement between the two periods.");
        return;
    }

    println!(
        "Top query movers ({} of {} significant):",
        result.query_changes.len().min(movers),
        result.query_changes.len()
    );
    for delta in result.query_changes.iter().take(movers) {
        println!(
            "  {:+7.1}% clicks  {:+5.2} pos  {} ({} -> {} clicks)",
            delta.clicks_change_pct,
            delta.position_change,
            delta.query,
            delta.previous.clicks,
            delta.current.clicks
        );
    }
}
