//! Boundary geometry records and their bounding boxes.

use geo::{BoundingRect, MultiPolygon, Point};
use rstar::AABB;
use serde::{Deserialize, Serialize};

/// Feature properties as they appear in the source GeoJSON
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Axis-aligned bounding box `(min_x, min_y, max_x, max_y)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Square box of half-width `epsilon` centred on `point`
    pub fn around(point: Point<f64>, epsilon: f64) -> Self {
        Self::new(
            point.x() - epsilon,
            point.y() - epsilon,
            point.x() + epsilon,
            point.y() + epsilon,
        )
    }

    /// Boxes sharing an edge or a corner count as intersecting.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Smallest box enclosing both
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn to_aabb(&self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

impl std::str::FromStr for BoundingBox {
    type Err = String;

    /// Parses `min_x,min_y,max_x,max_y`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid bounding box '{}': {}", s, e))?;

        match parts.as_slice() {
            [min_x, min_y, max_x, max_y] => Ok(Self::new(*min_x, *min_y, *max_x, *max_y)),
            _ => Err(format!(
                "invalid bounding box '{}': expected min_x,min_y,max_x,max_y",
                s
            )),
        }
    }
}

/// A single boundary polygon with its feature properties
#[derive(Debug, Clone)]
pub struct GeometryRecord {
    pub geometry: MultiPolygon<f64>,
    pub properties: Properties,
}

impl GeometryRecord {
    pub fn new(geometry: MultiPolygon<f64>, properties: Properties) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// Get the bounding box of this record, `None` for an empty geometry
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.geometry
            .bounding_rect()
            .map(|rect| BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// String value of a property, if present and a string
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}
