//! SepaScan CLI — screen, inspect, and cache management commands.
//!
//! Commands:
//! - `screen` — run the full funnel over a universe and save artifacts
//! - `inspect` — run one symbol through the funnel and print the breakdown
//! - `cache status` — report fundamental cache entry counts and freshness

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local};
use clap::{Parser, Subcommand};

use sepascan_core::data::{PriceProvider, YahooFundamentals, YahooPrices};
use sepascan_core::fundamentals::{
    CacheOnlyFundamentals, CachedFundamentals, FundamentalSource, RetryPolicy, SnapshotCache,
};
use sepascan_core::{Funnel, FunnelResult};
use sepascan_runner::config::RunConfig;
use sepascan_runner::data_loader::{load_csv_series, load_series, LoadOptions};
use sepascan_runner::export::save_artifacts;
use sepascan_runner::screen::{run_screen, ConsoleProgress, ScreenOutcome};
use sepascan_runner::universe::Universe;

#[derive(Parser)]
#[command(name = "sepascan", about = "SepaScan CLI — stage-2 equity screener")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full screen over a universe and save artifacts.
    Screen {
        /// Path to a TOML run config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to a TOML universe file (sector = [tickers] tables).
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Restrict to one sector of the universe.
        #[arg(long)]
        sector: Option<String>,

        /// Explicit symbols, overriding the universe.
        #[arg(long, num_args = 1..)]
        symbols: Vec<String>,

        /// Directory of per-symbol CSV files ({SYMBOL}.csv).
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Offline mode: no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Output directory for artifacts. Overrides the config.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Run one symbol through the funnel and print the breakdown.
    Inspect {
        /// Symbol to inspect.
        symbol: String,

        /// Path to a TOML run config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of per-symbol CSV files. Checked before the network.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Offline mode: no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Assumed RS rating. A real rating needs a whole batch, so a
        /// single-symbol inspection takes one as input.
        #[arg(long)]
        rs: Option<f64>,
    },
    /// Fundamental cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report entry counts and freshness of the fundamental cache.
    Status {
        /// Cache file. Defaults to ./fundamentals_cache.json.
        #[arg(long, default_value = "fundamentals_cache.json")]
        cache_path: PathBuf,

        /// TTL in days used for the freshness split.
        #[arg(long, default_value_t = 7)]
        ttl_days: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Screen {
            config,
            universe,
            sector,
            symbols,
            data_dir,
            offline,
            output_dir,
        } => run_screen_cmd(config, universe, sector, symbols, data_dir, offline, output_dir),
        Commands::Inspect {
            symbol,
            config,
            data_dir,
            offline,
            rs,
        } => run_inspect_cmd(&symbol, config, &data_dir, offline, rs),
        Commands::Cache { action } => match action {
            CacheAction::Status {
                cache_path,
                ttl_days,
            } => run_cache_status(&cache_path, ttl_days),
        },
    }
}

fn load_run_config(path: Option<PathBuf>) -> Result<RunConfig> {
    match path {
        Some(p) => RunConfig::from_file(&p).with_context(|| format!("load {}", p.display())),
        None => Ok(RunConfig::default()),
    }
}

/// Resolve the symbol list: explicit symbols win, then a universe file
/// (optionally one sector), then the config's list, then the built-in
/// default universe.
fn resolve_symbols(
    symbols: Vec<String>,
    universe_path: Option<PathBuf>,
    sector: Option<String>,
    config: &RunConfig,
) -> Result<Vec<String>> {
    if !symbols.is_empty() {
        if sector.is_some() {
            bail!("--sector has no effect with explicit --symbols");
        }
        return Ok(symbols);
    }

    let universe = match universe_path {
        Some(p) => Universe::from_file(&p)?,
        None => {
            if sector.is_none() && !config.universe.is_empty() {
                return Ok(config.universe.clone());
            }
            Universe::default_us()
        }
    };

    match sector {
        Some(name) => Ok(universe.sector_tickers(&name)?.to_vec()),
        None => Ok(universe.all_tickers()),
    }
}

fn run_screen_cmd(
    config_path: Option<PathBuf>,
    universe_path: Option<PathBuf>,
    sector: Option<String>,
    symbols: Vec<String>,
    data_dir: PathBuf,
    offline: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config = load_run_config(config_path)?;
    let symbols = resolve_symbols(symbols, universe_path, sector, &config)?;
    if symbols.is_empty() {
        bail!("no symbols to screen");
    }

    let opts = LoadOptions {
        offline,
        lookback_days: config.lookback_days,
    };
    let prices;
    let provider_ref: Option<&dyn PriceProvider> = if offline {
        None
    } else {
        prices = YahooPrices::new()?;
        Some(&prices)
    };

    eprintln!("Loading {} symbols...", symbols.len());
    let loaded = load_series(&symbols, Some(&data_dir), provider_ref, &opts);
    for skip in &loaded.skipped {
        eprintln!("WARNING: skipping {}: {}", skip.symbol, skip.reason);
    }
    if loaded.series.is_empty() {
        bail!("no price data loaded for any symbol");
    }

    let ttl = Duration::days(config.cache_ttl_days);
    let cache = match &config.cache_path {
        Some(path) => SnapshotCache::load(path, ttl)?,
        None => SnapshotCache::in_memory(ttl),
    };

    let outcome = if offline {
        let source = CacheOnlyFundamentals::new(cache);
        run_screen(
            &loaded.series,
            &source,
            &config,
            &loaded.dataset_hash,
            &loaded.skipped,
            &ConsoleProgress,
        )
    } else {
        let fundamentals = YahooFundamentals::new()?;
        let source = CachedFundamentals::new(&fundamentals, cache, RetryPolicy::default());
        let outcome = run_screen(
            &loaded.series,
            &source,
            &config,
            &loaded.dataset_hash,
            &loaded.skipped,
            &ConsoleProgress,
        );
        source.flush()?;
        outcome
    };

    print_screen_summary(&outcome);

    let out_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
    let run_dir = save_artifacts(&outcome, &config.screener, &out_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_inspect_cmd(
    symbol: &str,
    config_path: Option<PathBuf>,
    data_dir: &Path,
    offline: bool,
    rs: Option<f64>,
) -> Result<()> {
    let config = load_run_config(config_path)?;

    let csv_path = data_dir.join(format!("{symbol}.csv"));
    let series = if csv_path.exists() {
        load_csv_series(symbol, &csv_path)?
    } else if offline {
        bail!("no {} and network is off", csv_path.display());
    } else {
        YahooPrices::new()?.history(symbol, config.lookback_days)?
    };

    let ttl = Duration::days(config.cache_ttl_days);
    let cache = match &config.cache_path {
        Some(path) => SnapshotCache::load(path, ttl)?,
        None => SnapshotCache::in_memory(ttl),
    };

    let funnel = Funnel::new(&config.screener);
    let result = if offline {
        let source = CacheOnlyFundamentals::new(cache);
        funnel.evaluate(&series, rs, &source)
    } else {
        let fundamentals = YahooFundamentals::new()?;
        let source = CachedFundamentals::new(&fundamentals, cache, RetryPolicy::default());
        let result = funnel.evaluate(&series, rs, &source);
        source.flush()?;
        result
    };

    print_breakdown(&result, series.len(), rs);
    Ok(())
}

fn run_cache_status(cache_path: &Path, ttl_days: i64) -> Result<()> {
    if !cache_path.exists() {
        println!("Cache file does not exist: {}", cache_path.display());
        return Ok(());
    }

    let cache = SnapshotCache::load(cache_path, Duration::days(ttl_days))?;
    let now = Local::now().naive_local();
    let fresh = cache.fresh_count(now);

    println!("Cache: {}", cache_path.display());
    println!("Entries: {}", cache.len());
    println!("Fresh:   {fresh} (TTL {ttl_days} days, earnings-date aware)");
    println!("Stale:   {}", cache.len() - fresh);

    Ok(())
}

fn print_screen_summary(outcome: &ScreenOutcome) {
    let s = &outcome.summary;
    println!();
    println!("=== Screen Result ===");
    println!("Run:       {}", outcome.run_id);
    println!("Analyzed:  {}", s.total_analyzed);
    println!("Passed:    {}", s.passed);
    println!("Errors:    {}", s.errors);
    println!("Skipped:   {}", s.skipped);
    println!();
    println!(
        "{:<8} {:>6} {:<22} {:>4} {:<14} {:>9}",
        "Symbol", "Score", "Stage", "RS", "Entry", "Price"
    );
    println!("{}", "-".repeat(70));
    for r in outcome.results.iter().take(20) {
        println!(
            "{:<8} {:>6.1} {:<22} {:>4} {:<14} {:>9.2}",
            r.symbol,
            r.composite_score,
            r.stage.to_string(),
            r.rs_rating.map(|v| format!("{v:.0}")).unwrap_or_else(|| "-".into()),
            r.entry_signal.to_string(),
            r.current_price,
        );
    }
    println!();
}

fn print_breakdown(result: &FunnelResult, bar_count: usize, assumed_rs: Option<f64>) {
    println!();
    println!("=== {} ===", result.symbol);
    println!("Bars:          {bar_count}");
    println!("Stage:         {}", result.stage);
    println!("Passes:        {}", if result.passes { "yes" } else { "no" });
    println!("Reason:        {}", result.reason);
    match (result.rs_rating, assumed_rs) {
        (Some(v), Some(_)) => println!("RS rating:     {v:.1} (assumed)"),
        (Some(v), None) => println!("RS rating:     {v:.1}"),
        (None, _) => println!("RS rating:     unknown (pass --rs to assume one)"),
    }
    println!();
    println!("--- Pattern ---");
    let p = &result.pattern;
    println!("Score:         {}", p.pattern_score);
    println!("Tightening:    {}", p.volatility_tightening);
    println!("Volume dry-up: {}", p.volume_dry_up);
    println!("VCP:           {}", p.vcp_detected);
    println!("In pivot:      {}", p.in_pivot);
    println!("Accumulation:  {}", p.institutional_accumulation);
    println!();
    println!("--- Entry ---");
    println!("Signal:        {}", result.entry_signal);
    println!("Extended:      {}", result.is_extended);
    println!("Price:         {:.2}", result.current_price);
    if let Some(v) = result.pct_off_high {
        println!("Off high:      {:.1}%", v * 100.0);
    }
    if let Some(v) = result.pct_above_low {
        println!("Above low:     {:.1}%", v * 100.0);
    }
    if let Some(flags) = &result.fundamental_flags {
        println!();
        println!("--- Fundamentals ---");
        println!("Earnings accel:      {}", flags.earnings_acceleration);
        println!("Strong ROE:          {}", flags.roe_strong);
        println!("Institutional score: {}/8", flags.institutional_score);
    }
    println!();
    println!("Composite score: {:.1}", result.composite_score);
    println!();
}
