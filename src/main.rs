use anyhow::{Context, Result};
use clap::Parser;
use sortino_alloc::config::ConfigManager;
use sortino_alloc::data::{align_returns, CsvConnector, MarketData};
use sortino_alloc::engines::search::{optimize, LogProgressCallback};
use std::path::PathBuf;

/// Searches for the fund allocation with the best downside-adjusted return.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration with [search] and [universe] sections.
    #[arg(long, default_value = "alloc.toml")]
    config: PathBuf,

    /// Write the result as JSON to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Override the target daily growth factor (e.g. 1.0002).
    #[arg(long)]
    required_return: Option<f64>,

    /// Score by downside deviation alone, without the correlation penalty.
    #[arg(long)]
    no_downside_correl: bool,

    /// Number of scoring threads (0 = one per core).
    #[arg(long)]
    workers: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let manager = ConfigManager::new();
    manager
        .load_from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    manager.update(|c| {
        if let Some(required) = args.required_return {
            c.search.required_return = required;
        }
        if args.no_downside_correl {
            c.search.use_downside_correl = false;
        }
        if let Some(workers) = args.workers {
            c.search.num_workers = workers;
        }
    })?;
    let config = manager.get()?;

    let instruments = config.universe.instrument_list()?;
    let histories =
        CsvConnector::load_universe(&config.universe).context("Failed to load price data")?;
    let returns = align_returns(&instruments, &histories)?;
    log::info!(
        "Loaded {} common trading days for {} instruments",
        returns.num_days(),
        instruments.len()
    );

    let market = MarketData::new(instruments, returns, config.universe.expense_vector()?)?;
    let outcome = optimize(market, &config.search, LogProgressCallback)?;

    println!("Score: {:.6}", outcome.score);
    for (symbol, weight) in outcome.sparse() {
        println!("  {:<10} {:>8.4}", symbol, weight);
    }

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote result to {}", path.display());
    }

    Ok(())
}
