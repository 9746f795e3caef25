//! Normalizes `GeoJSON` features into [`NeighbourhoodRecord`] values.
//!
//! Uses a [`NeighbourhoodFieldMapping`] to pick the id and name properties
//! out of each feature regardless of the publisher's field naming.
//! `Polygon` and `MultiPolygon` geometries are both flattened into a list
//! of parts, each part an outer ring followed by its holes.

use std::collections::BTreeMap;

use geojson::{Feature, GeoJson};
use incident_map_neighborhood_models::{
    Coordinate, NeighbourhoodFieldMapping, NeighbourhoodRecord, Ring,
};
use incident_map_projection::{SourceFrame, transform};

use crate::NeighbourhoodError;

/// Parses a `GeoJSON` document into neighbourhood records.
///
/// Accepts a `FeatureCollection` or a single `Feature`.
///
/// # Errors
///
/// * [`NeighbourhoodError::GeoJson`] if the document does not parse
/// * [`NeighbourhoodError::MissingAttribute`] if a feature lacks a usable
///   id or name property
/// * [`NeighbourhoodError::InvalidGeometry`] if a feature's geometry is
///   missing or not areal
/// * [`NeighbourhoodError::Projection`] if a vertex cannot be converted
pub fn records_from_geojson(
    geojson_str: &str,
    fields: &NeighbourhoodFieldMapping,
) -> Result<Vec<NeighbourhoodRecord>, NeighbourhoodError> {
    let features = match geojson_str.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(NeighbourhoodError::MissingAttribute {
                feature_index: 0,
                attribute: fields.id.clone(),
            });
        }
    };

    let records = features
        .iter()
        .enumerate()
        .map(|(index, feature)| normalize_feature(index, feature, fields))
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("Normalized {} neighbourhood features", records.len());

    Ok(records)
}

/// Normalizes a single feature.
fn normalize_feature(
    index: usize,
    feature: &Feature,
    fields: &NeighbourhoodFieldMapping,
) -> Result<NeighbourhoodRecord, NeighbourhoodError> {
    let missing = |attribute: &str| NeighbourhoodError::MissingAttribute {
        feature_index: index,
        attribute: attribute.to_string(),
    };

    let id = feature
        .property(&fields.id)
        .and_then(parse_id)
        .ok_or_else(|| missing(&fields.id))?;

    let name = feature
        .property(&fields.name)
        .and_then(property_to_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| missing(&fields.name))?;

    let invalid = |reason: &str| NeighbourhoodError::InvalidGeometry {
        id,
        reason: reason.to_string(),
    };

    let polygons = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(geojson::Value::Polygon(rings)) => vec![rings.clone()],
        Some(geojson::Value::MultiPolygon(polygons)) => polygons.clone(),
        Some(_) => return Err(invalid("geometry is not a Polygon or MultiPolygon")),
        None => return Err(invalid("feature has no geometry")),
    };

    let parts = polygons
        .iter()
        .map(|rings| {
            rings
                .iter()
                .map(|positions| convert_ring(positions, fields.frame, id))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let attributes: BTreeMap<String, String> = feature
        .properties
        .iter()
        .flatten()
        .filter_map(|(key, value)| property_to_string(value).map(|v| (key.clone(), v)))
        .collect();

    Ok(NeighbourhoodRecord {
        id,
        name,
        parts,
        attributes,
    })
}

fn convert_ring(
    positions: &[Vec<f64>],
    frame: SourceFrame,
    id: i64,
) -> Result<Ring, NeighbourhoodError> {
    positions
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok(Coordinate::from(transform(*x, *y, frame)?)),
            _ => Err(NeighbourhoodError::InvalidGeometry {
                id,
                reason: "position has fewer than 2 coordinates".to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Ring)
}

/// Reads an integer id from a number or an integer-valued string.
#[allow(clippy::cast_possible_truncation)]
fn parse_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

fn property_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
