//! Name resolution run.
//!
//! Reads boundary names, resolves each one against the reference table through
//! the geocoder, and writes the resolution cache. Names already in the cache are
//! skipped, so an interrupted run can simply be started again.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use munijoin::config::Config;
use munijoin::io::{download, load_feature_collection, load_reference_csv};
use munijoin::names::{NameResolver, NominatimClient, Outcome};
use munijoin::ResolutionCache;

#[derive(Parser, Debug)]
#[command(name = "resolve")]
#[command(about = "Resolve boundary names against the reference table")]
struct Args {
    /// Boundary GeoJSON, one feature per municipality
    #[arg(short, long)]
    boundaries: PathBuf,

    /// Reference table (CSV export of the statistics spreadsheet)
    #[arg(short, long)]
    reference: PathBuf,

    /// Resolution cache file
    #[arg(short, long, default_value = "muni_names.cache.json")]
    cache: PathBuf,

    /// TOML config file (built-in config when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Download configured sources first
    #[arg(long)]
    download: bool,

    /// Log geocoder failures and continue with the next name
    #[arg(long)]
    keep_going: bool,
}

#[derive(Debug, Default)]
struct Stats {
    cached: usize,
    resolved: usize,
    unresolved: usize,
    failed: usize,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::builtin()?,
    };

    if args.download {
        for source in &config.sources {
            download(&source.url, &source.path)?;
        }
    }

    let reference = load_reference_csv(&args.reference, &config.reference)?;
    let boundaries = load_feature_collection(&args.boundaries)?;
    let names: Vec<&str> = boundaries
        .property_values(&config.matching.source_name_field)
        .collect();
    info!(
        "{} of {} boundaries carry a '{}' name",
        names.len(),
        boundaries.len(),
        config.matching.source_name_field
    );

    let mut cache = ResolutionCache::open(&args.cache).context("Failed to open resolution cache")?;

    let aliases = config.alias_table();
    let geocoder =
        NominatimClient::new(&config.geocoder).context("Failed to create geocoder client")?;
    let resolver = NameResolver::new(geocoder, &reference, &aliases)
        .with_threshold(config.matching.threshold)
        .with_locale(&config.geocoder.locale);

    let pb = ProgressBar::new(names.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
    );

    let mut stats = Stats::default();

    for name in names {
        pb.set_message(name.to_string());

        match resolver.resolve(name, &mut cache) {
            Ok(Outcome::Cached) => stats.cached += 1,
            Ok(Outcome::Resolved { .. }) => stats.resolved += 1,
            Ok(Outcome::Unresolved(_)) => stats.unresolved += 1,
            Err(e) if args.keep_going => {
                error!("Failed to resolve '{}': {}", name, e);
                stats.failed += 1;
            }
            Err(e) => {
                pb.abandon();
                // Keep what was resolved so far; the next run resumes from here
                cache.save()?;
                return Err(e).with_context(|| format!("Failed to resolve '{}'", name));
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    cache.save()?;

    info!(
        "Done: {} resolved, {} unresolved, {} already cached, {} failed",
        stats.resolved, stats.unresolved, stats.cached, stats.failed
    );

    Ok(())
}
