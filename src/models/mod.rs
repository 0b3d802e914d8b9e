//! Core data models shared by the spatial and name paths.

pub mod attributes;
pub mod geometry;

pub use attributes::{AttributeRecord, FieldValue, ReferenceTable};
pub use geometry::{BoundingBox, GeometryRecord, Properties};
