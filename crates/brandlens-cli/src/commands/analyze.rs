use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Args;

use brandlens_core::{
    aggregate, aggregate::TOP_QUERIES, BrandPattern, ClassAggregate, DateRange, PeriodResult,
};
use brandlens_gsc::fetch_period;

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Site to analyze (domain, URL, or sc-domain: identifier)
    #[arg(long)]
    pub site: String,

    /// Window start, YYYY-MM-DD
    #[arg(long)]
    pub start_date: String,

    /// Window end, YYYY-MM-DD
    #[arg(long)]
    pub end_date: String,

    /// `|`-separated brand keywords; empty treats every query as non-brand
    #[arg(long, default_value = "")]
    pub pattern: String,

    /// OAuth bearer token with the webmasters.readonly scope
    #[arg(long, env = "GSC_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Write the full query export to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

pub async fn run(args: AnalyzeArgs, timeout_secs: u64) -> anyhow::Result<()> {
    let pattern = BrandPattern::compile(&args.pattern)?;
    let today = Utc::now().date_naive();
    let range = DateRange::parse(&args.start_date, &args.end_date, today)?;

    let (client, property) =
        super::connect_and_resolve(&args.access_token, &args.site, timeout_secs).await?;
    let fetched = fetch_period(&client, &property, &range).await?;
    let period = aggregate(fetched.rows, &pattern, fetched.total_clicks_reported);

    print_period(&args.site, &range, &period);

    if let Some(path) = args.csv {
        let csv = brandlens_report::render_period_csv(&args.site, &range, Utc::now(), &period)?;
        std::fs::write(&path, csv).with_context(|| format!("writing {}", path.display()))?;
        println!("Full query export written to {}.", path.display());
    }

    Ok(())
}

fn print_period(site: &str, range: &DateRange, period: &PeriodResult) {
    println!(
        "Search performance for {site} ({} to {})",
        range.start, range.end
    );
    println!();
    println!(
        "Total clicks (incl. unattributed): {}",
        period.total_with_unattributed
    );
    println!(
        "Unattributed clicks: {} ({:.1}%)",
        period.unattributed_clicks, period.unattributed_share_pct
    );
    println!("Total impressions: {}", period.total_impressions);
    println!("Visibility score: {:.1}", period.visibility_score);
    println!();
    print_class("Brand", &period.brand);
    print_class("Non-brand", &period.non_brand);
}

fn print_class(label: &str, class: &ClassAggregate) {
    println!(
        "{label}: {} clicks, {} impressions, CTR {:.2}%, avg position {:.1}, share {:.1}%",
        class.clicks, class.impressions, class.ctr, class.avg_position, class.share_pct
    );
    for q in class.top_queries(TOP_QUERIES) {
        println!(
            "  {:>7} clicks  {:>9} impr  pos {:>5.1}  {}",
            q.clicks, q.impressions, q.position, q.query
        );
    }
    println!();
}
