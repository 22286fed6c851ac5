//! Shared helpers for the hum command-line tools

pub mod output;

use anyhow::{Context, Result};
use hum_core::{MatcherConfig, Profile, WeightConfig};
use std::path::Path;

/// Logs are off by default so stdout stays clean JSON
pub fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

/// Load the TOML config if a path is given, else the built-in defaults
pub fn load_config(path: Option<&str>) -> Result<MatcherConfig> {
    match path {
        Some(path) => {
            let config = MatcherConfig::load(Path::new(path))?;
            log::info!("Loaded configuration from: {}", path);
            Ok(config)
        }
        None => Ok(MatcherConfig::default()),
    }
}

/// Parse a `channel=weight` command-line pair
pub fn parse_weight(s: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CHANNEL=WEIGHT, got {:?}", s))?;
    let weight: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid weight {:?}: {}", value, e))?;
    Ok((name.trim().to_string(), weight))
}

/// Weights from, in order of precedence: `--weight` pairs, `--profile`,
/// then the config file
pub fn resolve_weights(
    config: &MatcherConfig,
    profile: Option<Profile>,
    overrides: &[(String, f64)],
) -> Result<WeightConfig> {
    let weights = if !overrides.is_empty() {
        WeightConfig::from_pairs(overrides.iter().map(|(n, w)| (n.as_str(), *w)))
    } else if let Some(profile) = profile {
        Ok(profile.weights())
    } else {
        config.weight_config()
    };
    weights.context("Invalid weight configuration")
}

/// Parse `melody` / `full`
pub fn parse_profile(s: &str) -> std::result::Result<Profile, String> {
    match s.to_ascii_lowercase().as_str() {
        "melody" => Ok(Profile::Melody),
        "full" => Ok(Profile::Full),
        other => Err(format!("unknown profile {:?} (expected melody or full)", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hum_core::Channel;

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("pitch=0.8").unwrap(), ("pitch".to_string(), 0.8));
        assert!(parse_weight("pitch").is_err());
        assert!(parse_weight("pitch=high").is_err());
    }

    #[test]
    fn test_resolve_weights_precedence() {
        let config = MatcherConfig::default();

        let from_config = resolve_weights(&config, None, &[]).unwrap();
        assert_eq!(from_config, Profile::Melody.weights());

        let from_profile = resolve_weights(&config, Some(Profile::Full), &[]).unwrap();
        assert!(from_profile.is_enabled(Channel::Chroma));

        let overrides = vec![("mfcc".to_string(), 1.0)];
        let from_flags = resolve_weights(&config, Some(Profile::Full), &overrides).unwrap();
        assert_eq!(from_flags.channels().collect::<Vec<_>>(), vec![Channel::Mfcc]);
    }

    #[test]
    fn test_bad_override_is_an_error() {
        let overrides = vec![("loudness".to_string(), 1.0)];
        assert!(resolve_weights(&MatcherConfig::default(), None, &overrides).is_err());
    }
}
