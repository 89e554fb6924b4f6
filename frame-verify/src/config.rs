//! Command-line arguments and run settings for frame-verify
//!
//! Command-line values override the TOML file, which overrides built-in
//! defaults. Credentials are resolved separately by
//! `frame_common::config::resolve_credentials`.

use clap::Parser;
use frame_common::config::{MatchStrategy, ThrottleKind, TomlConfig};
use std::path::PathBuf;

const DEFAULT_OUTPUT: &str = "verified_winners.txt";

#[derive(Parser, Debug, Clone)]
#[command(name = "frame-verify")]
#[command(about = "Verify and repair the award-winner movie listing against TMDB")]
#[command(version)]
pub struct Args {
    /// Listing to verify (lines like `28, // Wings (1927)`)
    #[arg(required_unless_present = "write_config")]
    pub input: Option<PathBuf>,

    /// Where to write the corrected listing
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file (falls back to FRAME_CONFIG, then the platform config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// TMDB v3 API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// TMDB v4 read access token
    #[arg(long)]
    pub access_token: Option<String>,

    /// Title comparison strategy: containment, jaro-winkler, levenshtein
    #[arg(long)]
    pub matcher: Option<MatchStrategy>,

    /// Similarity threshold for jaro-winkler / levenshtein
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Pause policy between records: fixed, backoff, token-bucket
    #[arg(long)]
    pub throttle: Option<ThrottleKind>,

    /// Fixed delay (or backoff base) in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Prefer search results released in the listed year
    #[arg(long)]
    pub check_year: bool,

    /// Write the effective configuration (without credentials) to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub write_config: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of the file configuration
    pub fn apply_to(&self, mut config: TomlConfig) -> TomlConfig {
        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }
        if let Some(strategy) = self.matcher {
            config.matching.strategy = strategy;
        }
        if let Some(threshold) = self.threshold {
            config.matching.threshold = Some(threshold);
        }
        if self.check_year {
            config.matching.check_year = true;
        }
        if let Some(policy) = self.throttle {
            config.throttle.policy = policy;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.throttle.delay_ms = delay_ms;
        }
        config
    }
}

/// Output path from merged configuration, falling back to the default name
pub fn output_path(config: &TomlConfig) -> PathBuf {
    config
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
}
