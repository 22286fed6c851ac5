//! humstats - Print diagnostics for feature files
//!
//! Usage: humstats <features>... | humstats --catalog <dir>

use anyhow::Result;
use clap::Parser;
use hum_cli::init_logger;
use hum_cli::output::print_stats;
use hum_store::{Catalog, FeatureReader, FeatureStats};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "humstats")]
#[command(
    about = "Inspect extracted features for zeros, NaN and silent pitch tracks",
    long_about = None
)]
struct Args {
    /// Feature files to inspect
    files: Vec<String>,

    /// Inspect every feature file in this catalog directory
    #[arg(long)]
    catalog: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(args.verbose);

    if args.files.is_empty() && args.catalog.is_none() {
        anyhow::bail!("Nothing to inspect: pass feature files or --catalog <dir>");
    }

    for file in &args.files {
        let features = FeatureReader::read(Path::new(file))?;
        print_stats(file, &FeatureStats::compute(&features.features));
    }

    if let Some(dir) = &args.catalog {
        let catalog = Catalog::load_dir(Path::new(dir))?;
        if catalog.is_empty() {
            log::warn!("No songs in catalog {}", dir);
        }
        for entry in catalog.entries() {
            print_stats(
                &entry.path.display().to_string(),
                &FeatureStats::compute(&entry.file.features),
            );
        }
    }

    Ok(())
}
