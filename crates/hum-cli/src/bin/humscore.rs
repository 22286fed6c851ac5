//! humscore - Compare two feature files, or one file with itself
//!
//! Usage:
//!   humscore <query_features> <candidate_features>
//!   humscore <features>            # self-similarity check

use anyhow::Result;
use clap::Parser;
use hum_cli::output::print_match_result;
use hum_cli::{init_logger, load_config, parse_profile, parse_weight, resolve_weights};
use hum_core::{Matcher, Profile};
use hum_store::FeatureReader;
use std::path::Path;

/// Self-comparisons below this total suggest broken features
const SELF_SIMILARITY_FLOOR: f64 = 95.0;

#[derive(Parser, Debug)]
#[command(name = "humscore")]
#[command(about = "Score one feature file against another (or itself)", long_about = None)]
struct Args {
    /// Query feature file
    query: String,

    /// Candidate feature file (defaults to the query itself)
    candidate: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Scoring profile: melody or full
    #[arg(short, long, value_parser = parse_profile)]
    profile: Option<Profile>,

    /// Channel weight as CHANNEL=WEIGHT (repeatable, replaces the profile)
    #[arg(short, long = "weight", value_parser = parse_weight)]
    weights: Vec<(String, f64)>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(args.verbose);

    run_humscore(&args)?;

    Ok(())
}

fn run_humscore(args: &Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let weights = resolve_weights(&config, args.profile, &args.weights)?;
    let matcher = Matcher::new(&config)?;

    let query = FeatureReader::read(Path::new(&args.query))?;
    let self_check = args.candidate.is_none();
    let candidate = match &args.candidate {
        Some(path) => FeatureReader::read(Path::new(path))?,
        None => query.clone(),
    };

    let mut result = matcher.score(&query.features, &candidate.features, &weights)?;
    result.candidate_id = candidate.metadata.song_id.clone();

    if self_check && result.total_score < SELF_SIMILARITY_FLOOR {
        log::warn!(
            "Self-similarity of {} is only {:.2} (expected >= {})",
            query.display_name(),
            result.total_score,
            SELF_SIMILARITY_FLOOR
        );
    }

    print_match_result(&result);

    Ok(())
}
