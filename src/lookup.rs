//! Point -> municipality attributes, joining the spatial path with the resolution cache.

use geo::Point;

use crate::cache::{CacheEntry, CachedRecord, ResolutionCache};
use crate::models::Properties;
use crate::pip::{GeometryStore, PointResolver};

/// Result of a point lookup that landed inside a boundary
#[derive(Debug, Clone, PartialEq)]
pub struct Located<'a> {
    /// Raw municipality name read from the boundary properties
    pub name: Option<&'a str>,
    pub properties: &'a Properties,
    /// Cached attributes; `None` when the name is missing, unresolved or never attempted
    pub attributes: Option<&'a CachedRecord>,
}

pub struct MunicipalityLookup<'c, S> {
    resolver: PointResolver<S>,
    cache: &'c ResolutionCache,
    name_field: String,
}

impl<'c, S: GeometryStore> MunicipalityLookup<'c, S> {
    pub fn new(resolver: PointResolver<S>, cache: &'c ResolutionCache, name_field: &str) -> Self {
        Self {
            resolver,
            cache,
            name_field: name_field.to_string(),
        }
    }

    /// `None` when no boundary contains the point
    pub fn lookup(&self, point: Point<f64>) -> Option<Located<'_>> {
        let properties = self.resolver.resolve(point)?;
        let name = properties.get(&self.name_field).and_then(|v| v.as_str());
        let attributes = name
            .and_then(|n| self.cache.get(n))
            .and_then(CacheEntry::record);

        Some(Located {
            name,
            properties,
            attributes,
        })
    }

    pub fn resolver(&self) -> &PointResolver<S> {
        &self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttributeRecord, GeometryRecord};
    use crate::pip::{FeatureCollection, SpatialIndex};
    use geo::{LineString, MultiPolygon, Polygon};
    use serde_json::json;

    fn boundary(x: f64, y: f64, name: &str) -> GeometryRecord {
        let poly = Polygon::new(
            LineString::from(vec![
                (x, y),
                (x + 1.0, y),
                (x + 1.0, y + 1.0),
                (x, y + 1.0),
            ]),
            vec![],
        );
        let mut properties = Properties::new();
        properties.insert("shapeName".into(), name.into());
        GeometryRecord::new(MultiPolygon::new(vec![poly]), properties)
    }

    #[test]
    fn test_point_to_attributes() {
        let store = FeatureCollection::new(vec![
            boundary(35.0, 32.0, "Sachnin"),
            boundary(36.0, 32.0, "Migdal Tefen"),
            boundary(37.0, 32.0, "Nowhere"),
        ]);
        let index = SpatialIndex::build(&store, store.extent().unwrap());

        let mut cache = ResolutionCache::in_memory();
        let record = AttributeRecord::new()
            .with("name", "סחנין")
            .with("population", 31200_i64);
        cache.put("Sachnin", CacheEntry::resolved(&record));
        cache.put("Migdal Tefen", CacheEntry::Unresolved);

        let lookup = MunicipalityLookup::new(PointResolver::new(index), &cache, "shapeName");

        let hit = lookup.lookup(Point::new(35.5, 32.5)).unwrap();
        assert_eq!(hit.name, Some("Sachnin"));
        assert_eq!(
            serde_json::Value::Object(hit.attributes.unwrap().clone()),
            json!({"name": "סחנין", "population": 31200})
        );

        let unresolved = lookup.lookup(Point::new(36.5, 32.5)).unwrap();
        assert_eq!(unresolved.name, Some("Migdal Tefen"));
        assert!(unresolved.attributes.is_none());

        let unknown = lookup.lookup(Point::new(37.5, 32.5)).unwrap();
        assert!(unknown.attributes.is_none());

        assert!(lookup.lookup(Point::new(10.0, 10.0)).is_none());
    }
}
