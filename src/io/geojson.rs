use anyhow::{bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::models::{GeometryRecord, Properties};
use crate::pip::FeatureCollection;

type Ring = Vec<Vec<f64>>;

#[derive(Debug, Deserialize)]
struct FeatureCollectionDoc {
    features: Vec<FeatureDoc>,
}

#[derive(Debug, Deserialize)]
struct FeatureDoc {
    geometry: Option<GeometryDoc>,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeometryDoc {
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
    #[serde(other)]
    Unsupported,
}

/// Load polygon features from a GeoJSON FeatureCollection file
pub fn load_feature_collection<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let path = path.as_ref();
    info!("Loading boundaries from {}", path.display());
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {}", path.display()))?;
    read_feature_collection(BufReader::new(file))
        .with_context(|| format!("Failed to read GeoJSON file: {}", path.display()))
}

/// Polygon and MultiPolygon features in file order; other geometry types are skipped.
pub fn read_feature_collection<R: Read>(reader: R) -> Result<FeatureCollection> {
    let doc: FeatureCollectionDoc =
        serde_json::from_reader(reader).context("Failed to parse GeoJSON")?;

    let mut records = Vec::with_capacity(doc.features.len());
    let mut skipped = 0;

    for (i, feature) in doc.features.into_iter().enumerate() {
        let geometry = match feature.geometry {
            Some(GeometryDoc::Polygon { coordinates }) => MultiPolygon::new(vec![
                to_polygon(coordinates).with_context(|| format!("feature {}", i))?,
            ]),
            Some(GeometryDoc::MultiPolygon { coordinates }) => MultiPolygon::new(
                coordinates
                    .into_iter()
                    .map(to_polygon)
                    .collect::<Result<_>>()
                    .with_context(|| format!("feature {}", i))?,
            ),
            Some(GeometryDoc::Unsupported) | None => {
                skipped += 1;
                continue;
            }
        };

        records.push(GeometryRecord::new(geometry, feature.properties.unwrap_or_default()));
    }

    if skipped > 0 {
        debug!("Skipped {} features without polygon geometry", skipped);
    }
    info!("Loaded {} boundary features", records.len());

    Ok(FeatureCollection::new(records))
}

fn to_polygon(rings: Vec<Ring>) -> Result<Polygon<f64>> {
    let mut rings = rings.into_iter();
    let exterior = match rings.next() {
        Some(ring) => to_ring(ring)?,
        None => bail!("Invalid polygon: missing exterior ring"),
    };
    let interiors = rings.map(to_ring).collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn to_ring(positions: Ring) -> Result<LineString<f64>> {
    let coords = positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => bail!("Invalid coordinate: expected at least two numbers"),
        })
        .collect::<Result<Vec<_>>>()?;

    // Polygon::new closes open rings
    Ok(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;
    use crate::pip::GeometryStore;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"shapeName": "Sachnin"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[35.2, 32.8], [35.3, 32.8], [35.3, 32.9], [35.2, 32.9], [35.2, 32.8]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"shapeName": "Eilat"},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[34.9, 29.5, 0.0], [35.0, 29.5, 0.0], [35.0, 29.6, 0.0]]],
                        [[[34.0, 29.0], [34.1, 29.0], [34.1, 29.1]], [[34.02, 29.02], [34.03, 29.02], [34.03, 29.03]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": {"shapeName": "Marker"},
                "geometry": {"type": "Point", "coordinates": [35.0, 32.0]}
            },
            {"type": "Feature", "properties": null, "geometry": null}
        ]
    }"#;

    #[test]
    fn test_read_polygons_and_multipolygons() {
        let store = read_feature_collection(SAMPLE.as_bytes()).unwrap();
        assert_eq!(store.len(), 2);

        let first = &store.records()[0];
        assert_eq!(first.property_str("shapeName"), Some("Sachnin"));
        assert_eq!(first.geometry.0.len(), 1);

        let second = &store.records()[1];
        assert_eq!(second.geometry.0.len(), 2);
        assert_eq!(second.geometry.0[1].interiors().len(), 1);
        // open ring closed on construction
        assert_eq!(second.geometry.0[0].exterior().0.len(), 4);
    }

    #[test]
    fn test_filter_loaded_store() {
        let store = read_feature_collection(SAMPLE.as_bytes()).unwrap();
        let hits: Vec<_> = store
            .filter(BoundingBox::new(35.25, 32.85, 35.25, 32.85))
            .filter_map(|r| r.property_str("shapeName"))
            .collect();
        assert_eq!(hits, vec!["Sachnin"]);
    }

    #[test]
    fn test_bad_coordinate() {
        let doc = r#"{"features": [{"properties": {}, "geometry": {"type": "Polygon", "coordinates": [[[1.0]]]}}]}"#;
        assert!(read_feature_collection(doc.as_bytes()).is_err());
    }

    #[test]
    fn test_not_geojson() {
        assert!(read_feature_collection("[]".as_bytes()).is_err());
    }
}
