use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mpf_etl::config::AppConfig;
use mpf_etl::models::MergedPayload;
use mpf_etl::pipeline::Pipeline;
use mpf_etl::{storage, utils};

#[derive(Parser)]
#[command(name = "mpf-etl", about = "MPF unit-price data ETL", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Full batch: workbooks → per-month artifacts → split → merge → top10
    Run,

    /// Convert raw workbooks into per-month consolidated JSON dumps
    Convert,

    /// Split the latest consolidated dump into trustees_schemes.json
    /// and fund_price_scheme.json
    Split,

    /// Merge all monthly snapshots into the multi-month fund_price_scheme.json
    Merge,

    /// Recompute the top-movers leaderboard from the merged artifact
    Top10,

    /// Show what the merged artifact currently covers
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "mpf_etl=info,warn",
        1 => "mpf_etl=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Run => {
            let _t = utils::Timer::start("Full pipeline");
            let stats = Pipeline::new(config).run()?;
            info!(
                "Done: {} month(s) written, {} skipped, {} rows",
                stats.months_written, stats.files_skipped, stats.rows_exported
            );
        }

        Command::Convert => {
            let _t = utils::Timer::start("Workbook conversion");
            let stats = Pipeline::new(config).convert()?;
            info!(
                "Done: {} file(s) converted, {} skipped",
                stats.months_written, stats.files_skipped
            );
        }

        Command::Split => {
            let _t = utils::Timer::start("Canonical split");
            Pipeline::new(config).split_latest()?;
        }

        Command::Merge => {
            let _t = utils::Timer::start("Multi-month merge");
            Pipeline::new(config).merge_all()?;
        }

        Command::Top10 => {
            let _t = utils::Timer::start("Leaderboard");
            Pipeline::new(config).leaderboard()?;
        }

        Command::Stats => {
            let pipeline = Pipeline::new(config);
            let merged: MergedPayload = storage::read_json(&pipeline.merged_input_path()?)?;
            let funds: usize = merged.data.iter().map(|g| g.funds.len()).sum();
            println!("─────────────────────────────────");
            println!("  MPF ETL — Merged Artifact");
            println!("─────────────────────────────────");
            println!("  Schemes  : {}", utils::fmt_number(merged.data.len() as i64));
            println!("  Funds    : {}", utils::fmt_number(funds as i64));
            println!("  Months   : {}", merged.months.len());
            println!(
                "  Range    : {} → {}",
                merged.months.first().map(String::as_str).unwrap_or("—"),
                merged.months.last().map(String::as_str).unwrap_or("—")
            );
            println!("─────────────────────────────────");
        }
    }

    Ok(())
}
