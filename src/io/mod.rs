//! File collaborators: boundary GeoJSON, reference CSV, downloads.

mod download;
mod geojson;
mod reference;

pub use download::download;
pub use geojson::{load_feature_collection, read_feature_collection};
pub use reference::{load_reference_csv, read_reference};
