//! Error types for the geocoder and the resolution cache.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("invalid geocoder endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("geocoder request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("geocoder returned HTTP {status} for query '{query}'")]
    Status { status: u16, query: String },

    #[error("could not decode geocoder response for query '{query}': {source}")]
    Decode {
        query: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to read cache file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse cache file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write cache file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}
