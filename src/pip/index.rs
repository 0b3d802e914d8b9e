//! Spatial index for fast boundary lookups.

use rstar::{RTree, RTreeObject, AABB};
use std::sync::Arc;
use tracing::info;

use super::GeometryStore;
use crate::models::{BoundingBox, GeometryRecord};

/// Wrapper for R-tree indexing of geometry records
#[derive(Clone)]
pub struct IndexedRecord {
    pub record: Arc<GeometryRecord>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedRecord {
    pub fn new(record: GeometryRecord) -> Option<Self> {
        let envelope = record.bbox()?.to_aabb();
        Some(Self {
            record: Arc::new(record),
            envelope,
        })
    }
}

/// Bounding-box index over geometry records using an R-tree
pub struct SpatialIndex {
    tree: RTree<IndexedRecord>,
}

impl SpatialIndex {
    /// Build the index from every record of `store` overlapping `bounds`.
    ///
    /// Records with an empty geometry are skipped. No matching records gives an
    /// empty index that answers every query with nothing.
    pub fn build<S: GeometryStore>(store: &S, bounds: BoundingBox) -> Self {
        info!("Building spatial index within {:?}...", bounds);

        let indexed: Vec<IndexedRecord> = store
            .filter(bounds)
            .cloned()
            .filter_map(IndexedRecord::new)
            .collect();

        let tree = RTree::bulk_load(indexed);

        info!("Indexed {} items", tree.size());

        Self { tree }
    }

    /// All indexed records whose bounding box intersects `bbox`, in no particular order
    pub fn query(&self, bbox: BoundingBox) -> impl Iterator<Item = &GeometryRecord> + '_ {
        self.tree
            .locate_in_envelope_intersecting(&bbox.to_aabb())
            .map(|ir| ir.record.as_ref())
    }

    /// Get total number of indexed records
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Iterate over all indexed records
    pub fn records(&self) -> impl Iterator<Item = &GeometryRecord> {
        self.tree.iter().map(|ir| ir.record.as_ref())
    }
}

impl GeometryStore for SpatialIndex {
    fn filter(&self, bbox: BoundingBox) -> impl Iterator<Item = &GeometryRecord> + '_ {
        self.query(bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Properties;
    use crate::pip::FeatureCollection;
    use geo::{LineString, MultiPolygon, Polygon};

    fn square(x: f64, y: f64, size: f64, id: i64) -> GeometryRecord {
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
        properties.insert("id".into(), id.into());
        GeometryRecord::new(MultiPolygon::new(vec![poly]), properties)
    }

    fn ids<'a>(records: impl Iterator<Item = &'a GeometryRecord>) -> Vec<i64> {
        let mut ids: Vec<i64> = records
            .filter_map(|r| r.properties.get("id").and_then(|v| v.as_i64()))
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_empty_index() {
        let store = FeatureCollection::default();
        let index = SpatialIndex::build(&store, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert!(index.is_empty());
        assert_eq!(index.query(BoundingBox::new(0.0, 0.0, 10.0, 10.0)).count(), 0);
    }

    #[test]
    fn test_build_excludes_records_outside_bounds() {
        let store =
            FeatureCollection::new(vec![square(0.0, 0.0, 1.0, 1), square(50.0, 50.0, 1.0, 2)]);
        let index = SpatialIndex::build(&store, BoundingBox::new(-1.0, -1.0, 10.0, 10.0));
        assert_eq!(index.len(), 1);
        assert_eq!(ids(index.records()), vec![1]);
    }

    #[test]
    fn test_query_returns_box_overlaps_without_duplicates() {
        let store = FeatureCollection::new(vec![
            square(0.0, 0.0, 2.0, 1),
            square(1.0, 1.0, 2.0, 2),
            square(5.0, 5.0, 1.0, 3),
        ]);
        let index = SpatialIndex::build(&store, store.extent().unwrap());

        assert_eq!(ids(index.query(BoundingBox::new(1.5, 1.5, 1.6, 1.6))), vec![1, 2]);
        assert_eq!(ids(index.query(BoundingBox::new(0.0, 0.0, 10.0, 10.0))), vec![1, 2, 3]);
        assert!(ids(index.query(BoundingBox::new(20.0, 20.0, 21.0, 21.0))).is_empty());
    }

    #[test]
    fn test_skips_empty_geometry() {
        let empty = GeometryRecord::new(MultiPolygon::new(vec![]), Properties::new());
        let store = FeatureCollection::new(vec![empty, square(0.0, 0.0, 1.0, 1)]);
        let index = SpatialIndex::build(&store, BoundingBox::new(-1.0, -1.0, 2.0, 2.0));
        assert_eq!(index.len(), 1);
    }
}
