//! Point resolver: coordinate -> properties of the containing boundary.

use geo::{Contains, Point};
use tracing::debug;

use super::GeometryStore;
use crate::models::{BoundingBox, GeometryRecord, Properties};

/// Half-width of the query box built around a point, in coordinate units
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Point-in-polygon lookup over any geometry store
pub struct PointResolver<S> {
    store: S,
    epsilon: f64,
}

impl<S: GeometryStore> PointResolver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            epsilon: DEFAULT_EPSILON,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Records whose bounding box intersects the epsilon box around `point`.
    ///
    /// A bounding box always encloses its geometry, so every containing record is in here.
    pub fn candidates(&self, point: Point<f64>) -> impl Iterator<Item = &GeometryRecord> + '_ {
        self.store.filter(BoundingBox::around(point, self.epsilon))
    }

    /// Properties of the first candidate (in retrieval order) that contains `point`.
    ///
    /// Overlapping polygons are not disambiguated; see [`Self::containing`].
    pub fn resolve(&self, point: Point<f64>) -> Option<&Properties> {
        let hit = self
            .candidates(point)
            .find(|record| record.geometry.contains(&point))
            .map(|record| &record.properties);

        debug!(
            "PIP lookup at ({}, {}): {}",
            point.x(),
            point.y(),
            if hit.is_some() { "hit" } else { "no match" }
        );

        hit
    }

    /// Every record containing `point`; more than one means the store has overlapping polygons
    pub fn containing(&self, point: Point<f64>) -> Vec<&GeometryRecord> {
        self.candidates(point)
            .filter(|record| record.geometry.contains(&point))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pip::{FeatureCollection, SpatialIndex};
    use geo::{LineString, MultiPolygon, Polygon};
    use serde_json::json;

    fn named(poly: Polygon<f64>, name: &str) -> GeometryRecord {
        let mut properties = Properties::new();
        properties.insert("name".into(), name.into());
        GeometryRecord::new(MultiPolygon::new(vec![poly]), properties)
    }

    fn square(x: f64, y: f64, size: f64, name: &str) -> GeometryRecord {
        named(
            Polygon::new(
                LineString::from(vec![
                    (x, y),
                    (x + size, y),
                    (x + size, y + size),
                    (x, y + size),
                ]),
                vec![],
            ),
            name,
        )
    }

    #[test]
    fn test_single_polygon_hit() {
        let store = FeatureCollection::new(vec![square(34.0, 31.0, 1.0, "X")]);
        let resolver = PointResolver::new(store);

        let props = resolver.resolve(Point::new(34.75, 31.5)).unwrap();
        assert_eq!(serde_json::Value::Object(props.clone()), json!({"name": "X"}));
    }

    #[test]
    fn test_outside_every_bbox_has_no_candidates() {
        let store =
            FeatureCollection::new(vec![square(0.0, 0.0, 1.0, "a"), square(2.0, 2.0, 1.0, "b")]);
        let resolver = PointResolver::new(store);

        let point = Point::new(10.0, 10.0);
        assert_eq!(resolver.candidates(point).count(), 0);
        assert!(resolver.resolve(point).is_none());
    }

    #[test]
    fn test_bbox_false_positive_is_rejected() {
        // Triangle whose bbox covers (0.9, 0.9) but whose area does not
        let triangle = named(
            Polygon::new(LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]), vec![]),
            "tri",
        );
        let resolver = PointResolver::new(FeatureCollection::new(vec![triangle]));

        let point = Point::new(0.9, 0.9);
        assert_eq!(resolver.candidates(point).count(), 1);
        assert!(resolver.resolve(point).is_none());
    }

    #[test]
    fn test_adjacent_polygons_pick_the_containing_one() {
        let records = vec![
            square(0.0, 0.0, 1.0, "west"),
            square(1.0, 0.0, 1.0, "east"),
            square(0.0, 1.0, 1.0, "north"),
        ];
        let store = FeatureCollection::new(records);
        let index = SpatialIndex::build(&store, store.extent().unwrap());
        let resolver = PointResolver::new(index);

        for (x, y, expected) in [(0.5, 0.5, "west"), (1.5, 0.5, "east"), (0.5, 1.5, "north")] {
            let props = resolver.resolve(Point::new(x, y)).unwrap();
            assert_eq!(props["name"], expected);
        }
        assert!(resolver.resolve(Point::new(1.5, 1.5)).is_none());
    }

    #[test]
    fn test_containing_record_is_always_a_candidate() {
        let records: Vec<GeometryRecord> = (0..10)
            .flat_map(|i| (0..10).map(move |j| (i, j)))
            .map(|(i, j)| square(i as f64, j as f64, 1.0, &format!("{}-{}", i, j)))
            .collect();
        let store = FeatureCollection::new(records);
        let index = SpatialIndex::build(&store, store.extent().unwrap());
        let resolver = PointResolver::new(index);

        for k in 0..50 {
            let point = Point::new((k % 10) as f64 + 0.3 + k as f64 * 0.01, (k / 5) as f64 + 0.25);
            let containing = resolver.containing(point);
            assert_eq!(containing.len(), 1, "point {:?}", point);
            let name = containing[0].property_str("name").unwrap();
            assert!(resolver
                .candidates(point)
                .any(|r| r.property_str("name") == Some(name)));
        }
    }

    #[test]
    fn test_overlap_reported_by_containing() {
        let store = FeatureCollection::new(vec![
            square(0.0, 0.0, 2.0, "big"),
            square(0.5, 0.5, 1.0, "small"),
        ]);
        let resolver = PointResolver::new(store);

        let point = Point::new(1.0, 1.0);
        assert_eq!(resolver.containing(point).len(), 2);
        // first in retrieval order wins
        assert_eq!(resolver.resolve(point).unwrap()["name"], "big");
    }

    #[test]
    fn test_point_on_boundary_is_not_contained() {
        let resolver = PointResolver::new(FeatureCollection::new(vec![square(0.0, 0.0, 1.0, "a")]));
        assert!(resolver.resolve(Point::new(0.0, 0.5)).is_none());
    }
}
