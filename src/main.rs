//! Macro conditions CLI.
//!
//! ```bash
//! # live fetch (needs FRED_API_KEY), write public/data/dashboard.json
//! macro-conditions
//!
//! # keep the raw inputs, then re-score them offline for another date
//! macro-conditions --save-snapshot raw.json
//! macro-conditions --snapshot raw.json --as-of 2025-06-30 --output out.json
//! ```

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use macro_conditions_lib::core::orchestrator;
use macro_conditions_lib::core::snapshot::write_dashboard;
use macro_conditions_lib::{AppConfig, Pipeline, RawSnapshot, ScoringConfig, SeriesStore};

#[derive(Parser)]
#[command(name = "macro-conditions")]
#[command(about = "Score macro conditions from FRED and Yahoo Finance series", long_about = None)]
#[command(version)]
struct Cli {
    /// Date treated as "today" (YYYY-MM-DD, default: current UTC date)
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,

    /// Scoring config JSON (weights, inverted and display-only factors)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard output path
    #[arg(short, long, default_value = "public/data/dashboard.json")]
    output: PathBuf,

    /// Score a saved raw snapshot instead of fetching
    #[arg(long, conflicts_with = "save_snapshot")]
    snapshot: Option<PathBuf>,

    /// Save the fetched raw inputs to this path
    #[arg(long)]
    save_snapshot: Option<PathBuf>,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", s, e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let as_of = cli.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let config = match &cli.config {
        Some(path) => ScoringConfig::from_json_file(path)
            .with_context(|| format!("loading scoring config {}", path.display()))?,
        None => ScoringConfig::default(),
    };
    let pipeline = Pipeline::new(config)?;

    let snapshot = match &cli.snapshot {
        Some(path) => RawSnapshot::load(path).with_context(|| format!("loading snapshot {}", path.display()))?,
        None => {
            let app = AppConfig::from_env()?;
            let snapshot = orchestrator::fetch_all(&app, pipeline.config(), as_of).await;
            if let Some(path) = &cli.save_snapshot {
                snapshot.save(path)?;
            }
            snapshot
        }
    };

    let store = SeriesStore::from_raw(&snapshot.series);
    info!("Scoring {} raw series as of {}", store.len(), as_of);
    let dashboard = pipeline.run(&store, as_of)?;
    write_dashboard(&dashboard, &cli.output)?;

    println!("\n✓ Done! Written to {}", cli.output.display());
    println!("  Overall Score: {:.1} (prev: {:.1})", dashboard.score, dashboard.prev_score);
    for module in &dashboard.modules {
        println!("  {:12}: {:.1}", module.name, module.score);
    }

    Ok(())
}
