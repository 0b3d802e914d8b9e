//! Munijoin - joins municipal boundary polygons with per-municipality statistics.
//!
//! This library provides the spatial lookup, name resolution and cache used by
//! the `resolve` and `locate` binaries.

pub mod cache;
pub mod config;
pub mod error;
pub mod io;
pub mod lookup;
pub mod models;
pub mod names;
pub mod pip;

pub use cache::{CacheEntry, ResolutionCache};
pub use lookup::{Located, MunicipalityLookup};
pub use models::{AttributeRecord, BoundingBox, GeometryRecord, ReferenceTable};
