//! Point lookup.
//!
//! Resolves coordinates to the boundary that contains them and prints the
//! cached municipal attributes for that boundary, one JSON object per point.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use geo::Point;
use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use munijoin::config::Config;
use munijoin::io::load_feature_collection;
use munijoin::pip::{PointResolver, SpatialIndex, DEFAULT_EPSILON};
use munijoin::{BoundingBox, MunicipalityLookup, ResolutionCache};

#[derive(Parser, Debug)]
#[command(name = "locate")]
#[command(about = "Look up municipal attributes for coordinates")]
struct Args {
    /// Points as x,y (same CRS as the boundaries)
    #[arg(required = true, allow_hyphen_values = true)]
    points: Vec<String>,

    /// Boundary GeoJSON
    #[arg(short, long)]
    boundaries: PathBuf,

    /// Resolution cache file
    #[arg(short, long, default_value = "muni_names.cache.json")]
    cache: PathBuf,

    /// TOML config file (built-in config when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only index boundaries overlapping min_x,min_y,max_x,max_y
    #[arg(long, allow_hyphen_values = true)]
    bounds: Option<BoundingBox>,

    /// Half-width of the query box around each point
    #[arg(long, default_value_t = DEFAULT_EPSILON)]
    epsilon: f64,

    /// Report points that fall inside more than one boundary
    #[arg(long)]
    strict: bool,
}

fn parse_point(s: &str) -> Result<Point<f64>> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| anyhow!("invalid point '{}': expected x,y", s))?;
    let x: f64 = x.trim().parse().with_context(|| format!("invalid x in '{}'", s))?;
    let y: f64 = y.trim().parse().with_context(|| format!("invalid y in '{}'", s))?;
    Ok(Point::new(x, y))
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::builtin()?,
    };
    let name_field = &config.matching.source_name_field;

    let points = args
        .points
        .iter()
        .map(|p| parse_point(p))
        .collect::<Result<Vec<_>>>()?;

    let boundaries = load_feature_collection(&args.boundaries)?;
    let bounds = match args.bounds.or_else(|| boundaries.extent()) {
        Some(bounds) => bounds,
        None => {
            warn!("No boundaries with geometry in {}", args.boundaries.display());
            BoundingBox::new(0.0, 0.0, 0.0, 0.0)
        }
    };
    let index = SpatialIndex::build(&boundaries, bounds);

    let cache = ResolutionCache::open(&args.cache).context("Failed to open resolution cache")?;
    info!("Looking up {} points", points.len());

    let resolver = PointResolver::new(index).with_epsilon(args.epsilon);
    let lookup = MunicipalityLookup::new(resolver, &cache, name_field);

    for point in points {
        if args.strict {
            let containing = lookup.resolver().containing(point);
            if containing.len() > 1 {
                let names: Vec<&str> = containing
                    .iter()
                    .filter_map(|r| r.property_str(name_field))
                    .collect();
                warn!(
                    "({}, {}) lies in {} overlapping boundaries: {:?}",
                    point.x(),
                    point.y(),
                    containing.len(),
                    names
                );
            }
        }

        let result = match lookup.lookup(point) {
            Some(located) => json!({
                "point": [point.x(), point.y()],
                "name": located.name,
                "properties": located.properties,
                "attributes": located.attributes,
            }),
            None => json!({
                "point": [point.x(), point.y()],
                "name": Value::Null,
            }),
        };
        println!("{}", serde_json::to_string(&result)?);
    }

    Ok(())
}
