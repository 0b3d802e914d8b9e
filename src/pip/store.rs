//! Geometry store abstraction and the plain in-memory feature collection.

use crate::models::{BoundingBox, GeometryRecord};

/// Anything that can enumerate geometry records by bounding-box overlap.
///
/// Results may include records whose geometry does not actually touch `bbox`;
/// callers that need exactness run their own containment test.
pub trait GeometryStore {
    fn filter(&self, bbox: BoundingBox) -> impl Iterator<Item = &GeometryRecord> + '_;
}

/// Feature collection held in source order
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    records: Vec<GeometryRecord>,
}

impl FeatureCollection {
    pub fn new(records: Vec<GeometryRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[GeometryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// String values of `field` across records, in source order; records without it are skipped
    pub fn property_values<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.records.iter().filter_map(move |r| r.property_str(field))
    }

    /// Bounding box enclosing every record, `None` if there are no non-empty geometries
    pub fn extent(&self) -> Option<BoundingBox> {
        self.records
            .iter()
            .filter_map(GeometryRecord::bbox)
            .reduce(|acc, b| acc.union(&b))
    }
}

impl GeometryStore for FeatureCollection {
    fn filter(&self, bbox: BoundingBox) -> impl Iterator<Item = &GeometryRecord> + '_ {
        self.records
            .iter()
            .filter(move |r| r.bbox().is_some_and(|b| b.intersects(&bbox)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Properties;
    use geo::{LineString, MultiPolygon, Polygon};

    fn square(x: f64, y: f64, size: f64, name: &str) -> GeometryRecord {
        let poly = Polygon::new(
            LineString::from(vec![
                (x, y),
                (x + size, y),
                (x + size, y + size),
                (x, y + size),
            ]),
            vec![],
        );
        let mut properties = Properties::new();
        properties.insert("name".into(), name.into());
        GeometryRecord::new(MultiPolygon::new(vec![poly]), properties)
    }

    #[test]
    fn test_filter_keeps_source_order() {
        let store = FeatureCollection::new(vec![
            square(0.0, 0.0, 2.0, "a"),
            square(5.0, 5.0, 1.0, "b"),
            square(1.0, 1.0, 2.0, "c"),
        ]);

        let names: Vec<&str> = store
            .filter(BoundingBox::new(1.5, 1.5, 1.6, 1.6))
            .filter_map(|r| r.property_str("name"))
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_property_values() {
        let mut unnamed = square(9.0, 9.0, 1.0, "x");
        unnamed.properties.clear();
        let store = FeatureCollection::new(vec![
            square(0.0, 0.0, 1.0, "a"),
            unnamed,
            square(2.0, 2.0, 1.0, "b"),
        ]);
        assert_eq!(store.property_values("name").collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_extent() {
        let store =
            FeatureCollection::new(vec![square(0.0, 0.0, 2.0, "a"), square(5.0, 5.0, 1.0, "b")]);
        assert_eq!(store.extent(), Some(BoundingBox::new(0.0, 0.0, 6.0, 6.0)));
        assert_eq!(FeatureCollection::default().extent(), None);
    }
}
