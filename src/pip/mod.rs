//! Point-in-Polygon (PIP) lookup over boundary geometries.
//!
//! Candidates are narrowed by bounding box, either linearly over a feature
//! collection or through an R-tree spatial index, then confirmed with an exact
//! containment test.

mod index;
mod service;
mod store;

pub use index::SpatialIndex;
pub use service::{PointResolver, DEFAULT_EPSILON};
pub use store::{FeatureCollection, GeometryStore};
