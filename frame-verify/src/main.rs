//! frame-verify - award listing verification tool
//!
//! Reads the static award-winner listing, checks every identifier against the
//! movie-metadata service, repairs what it can and writes the corrected
//! listing for inspection. Exit status is 0 even when records were flagged.

use anyhow::{Context, Result};
use clap::Parser;
use frame_common::config::{
    default_config_path, load_toml_config, resolve_config_path, resolve_credentials,
    write_toml_config, TomlConfig,
};
use std::sync::Arc;
use tracing::{info, warn};

use frame_verify::config::{output_path, Args};
use frame_verify::progress::ConsoleProgress;
use frame_verify::services::{
    build_matcher, build_throttle, extract_records, rate_limit_source, Resolver, TmdbClient,
};
use frame_verify::{render_report, write_report, Reconciler};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let file_config = match &config_path {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => TomlConfig::default(),
    };
    let config = args.apply_to(file_config);

    frame_common::logging::init_tracing(&config.logging)
        .context("Failed to initialize logging")?;

    info!(
        "Starting frame-verify v{}",
        env!("CARGO_PKG_VERSION")
    );
    match &config_path {
        Some(path) if path.exists() => info!("Loaded configuration from {}", path.display()),
        Some(path) => warn!(
            "Config file not found: {} (using built-in defaults)",
            path.display()
        ),
        None => warn!("No config directory available (using defaults)"),
    }

    if let Some(target) = &args.write_config {
        write_toml_config(&config.redacted(), target)
            .with_context(|| format!("Failed to write configuration to {}", target.display()))?;
        info!("Configuration written to {}", target.display());
        if default_config_path().as_deref() != Some(target.as_path()) {
            info!("Pass it with --config {} or FRAME_CONFIG", target.display());
        }
        return Ok(());
    }

    let input = args
        .input
        .as_ref()
        .context("No input listing given")?;
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read listing {}", input.display()))?;

    let records = extract_records(&text);
    info!("Found {} entries in {}", records.len(), input.display());
    if records.is_empty() {
        warn!("No `<id>, // <title>` entries found; output will be empty");
    }

    let credentials = resolve_credentials(
        args.api_key.as_deref(),
        args.access_token.as_deref(),
        &config.api,
    )?;
    let client = TmdbClient::new(&config.api, credentials)
        .context("Failed to build metadata client")?;

    let source = rate_limit_source(&config.throttle, Arc::new(client));
    let mut reconciler = Reconciler::new(source)
        .with_matcher(build_matcher(&config.matching))
        .with_throttle(build_throttle(&config.throttle))
        .with_resolver(Resolver::new(config.matching.check_year))
        .with_progress(ConsoleProgress::stdout());

    let report = reconciler.run(records).await;

    let output = output_path(&config);
    write_report(&report, &output)
        .with_context(|| format!("Failed to write corrected listing to {}", output.display()))?;

    let progress = reconciler.progress_mut();
    progress.block("\n--- corrected listing ---\n");
    progress.block(&render_report(&report));
    progress.finish();

    let stats = &report.statistics;
    info!("{}", stats.display_string());
    if stats.flagged > 0 {
        warn!(
            "{} record(s) need manual review in {}",
            stats.flagged,
            output.display()
        );
    }

    Ok(())
}
