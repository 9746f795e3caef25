//! `GeoJSON` hand-off for external map renderers.
//!
//! Each neighbourhood becomes a `MultiPolygon` feature whose properties
//! carry `name`, `count`, `topTypes` and `class`, the fields a choropleth
//! layer and its tooltip need.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Position, Value, feature::Id};
use incident_map_neighborhood::PolygonStore;
use incident_map_neighborhood_models::{Polygon, Ring};

use crate::view::{ChoroplethEntry, ChoroplethView};

/// Renders `view` as a `FeatureCollection`, one feature per neighbourhood,
/// in store order.
///
/// Entries whose neighbourhood is missing from `store` are skipped.
#[must_use]
pub fn feature_collection(view: &ChoroplethView, store: &PolygonStore) -> FeatureCollection {
    let features = view
        .neighbourhoods
        .iter()
        .filter_map(|entry| {
            let polygon = store.get(entry.id);
            if polygon.is_none() {
                log::warn!("No polygon for neighbourhood {}, skipping feature", entry.id);
            }
            polygon.map(|polygon| feature(entry, polygon))
        })
        .collect();

    FeatureCollection {
        bbox: store
            .bounding_box_union()
            .map(|b| vec![b.west, b.south, b.east, b.north]),
        features,
        foreign_members: None,
    }
}

fn feature(entry: &ChoroplethEntry, polygon: &Polygon) -> Feature {
    let parts: Vec<Vec<Vec<Position>>> = polygon
        .parts
        .iter()
        .map(|part| {
            std::iter::once(&part.exterior)
                .chain(&part.holes)
                .map(closed_ring)
                .collect::<Vec<_>>()
        })
        .collect();

    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), serde_json::json!(entry.name));
    properties.insert("count".to_string(), serde_json::json!(entry.count));
    properties.insert("topTypes".to_string(), serde_json::json!(entry.top_types));
    properties.insert("class".to_string(), serde_json::json!(entry.class));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::MultiPolygon(parts))),
        id: Some(Id::Number(entry.id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Ring positions with the first vertex repeated at the end, as `GeoJSON`
/// requires.
fn closed_ring(ring: &Ring) -> Vec<Position> {
    let mut positions: Vec<Position> = ring
        .vertices()
        .iter()
        .map(|c| vec![c.longitude, c.latitude])
        .collect();

    if let (Some(first), Some(last)) = (positions.first(), positions.last())
        && first != last
    {
        let first = first.clone();
        positions.push(first);
    }

    positions
}
