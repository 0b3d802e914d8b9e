//! Municipality name resolution.
//!
//! Raw names from the boundary dataset are canonicalized through a geocoding
//! service and fuzzy-matched against the reference attribute table.

pub mod aliases;
pub mod fuzzy;
mod geocoder;
mod resolver;

pub use aliases::{AliasTable, Substitution};
pub use fuzzy::{extract_one, weighted_ratio, Score, Similarity, WeightedRatio};
pub use geocoder::{Geocoder, NominatimClient, Place};
pub use resolver::{NameResolver, Outcome, Unresolved, DEFAULT_LOCALE, DEFAULT_THRESHOLD};
