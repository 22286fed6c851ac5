//! hummatch - Rank a catalog of songs against a hummed query
//!
//! Usage:
//!   hummatch <catalog_dir> <query_features>
//!   hummatch --config hum.toml --profile full --top-k 10 <catalog_dir> <query_features>

use anyhow::Result;
use clap::Parser;
use hum_cli::output::print_ranking;
use hum_cli::{init_logger, load_config, parse_profile, parse_weight, resolve_weights};
use hum_core::{FeatureBundle, Matcher, Profile, RankedMatches, WeightConfig};
use hum_store::{Catalog, FeatureReader};
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "hummatch")]
#[command(about = "Rank catalog songs by melodic similarity to a hummed query", long_about = None)]
struct Args {
    /// Directory of .json / .bin feature files
    catalog_dir: String,

    /// Feature file of the hummed query
    query: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Scoring profile: melody or full
    #[arg(short, long, value_parser = parse_profile)]
    profile: Option<Profile>,

    /// Channel weight as CHANNEL=WEIGHT (repeatable, replaces the profile)
    #[arg(short, long = "weight", value_parser = parse_weight)]
    weights: Vec<(String, f64)>,

    /// Number of top matches to report (defaults to the config value)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Also print the full ranking
    #[arg(long)]
    all: bool,

    /// Abandon the comparison after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(args.verbose);

    run_hummatch(&args)?;

    Ok(())
}

fn run_hummatch(args: &Args) -> Result<()> {
    let query_path = Path::new(&args.query);
    if !query_path.exists() {
        anyhow::bail!("Query file not found: {}", query_path.display());
    }

    let config = load_config(args.config.as_deref())?;
    let weights = resolve_weights(&config, args.profile, &args.weights)?;
    let top_k = args.top_k.unwrap_or(config.top_k);

    log::info!("Loading catalog from: {}", args.catalog_dir);
    let catalog = Catalog::load_dir(Path::new(&args.catalog_dir))?;

    log::info!("Loading query: {}", query_path.display());
    let query = FeatureReader::read(query_path)?;

    let matcher = Matcher::new(&config)?;
    let ranked = match args.timeout_ms {
        Some(ms) => compare_with_timeout(
            matcher,
            query.features,
            catalog.candidates(),
            weights,
            top_k,
            Duration::from_millis(ms),
        )?,
        None => matcher.compare(&query.features, &catalog.candidates(), &weights, top_k)?,
    };

    print_ranking(&args.query, &ranked, Some(&catalog), args.all);

    Ok(())
}

/// Run `compare` on a worker thread. On expiry the whole computation is
/// discarded; a partial ranking is never returned.
fn compare_with_timeout(
    matcher: Matcher,
    query: FeatureBundle,
    candidates: Vec<(String, FeatureBundle)>,
    weights: WeightConfig,
    top_k: usize,
    timeout: Duration,
) -> Result<RankedMatches> {
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        let result = matcher.compare(&query, &candidates, &weights, top_k);
        // The receiver is gone once the caller timed out
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => Ok(result?),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            anyhow::bail!("Matching timed out after {} ms; results discarded", timeout.as_millis())
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            anyhow::bail!("Matching worker terminated unexpectedly")
        }
    }
}
