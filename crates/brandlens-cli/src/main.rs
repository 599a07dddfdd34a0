mod commands;

use clap::{Parser, Subcommand};

use crate::commands::{analyze::AnalyzeArgs, compare::CompareArgs};

#[derive(Debug, Parser)]
#[command(name = "brandlens-cli")]
#[command(about = "Brand vs non-brand search performance analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Aggregate one period and print the summary
    Analyze(AnalyzeArgs),
    /// Compare two periods and list the significant movers
    Compare(CompareArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = brandlens_core::load_app_config_from_env()?;
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args, config.gsc_timeout_secs).await,
        Commands::Compare(args) => commands::compare::run(args, config.gsc_timeout_secs).await,
    }
}
