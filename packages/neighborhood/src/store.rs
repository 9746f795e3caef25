//! The immutable neighbourhood polygon store.

use std::collections::BTreeMap;

use geo::{Area, Centroid, LineString, MultiPolygon};
use incident_map_neighborhood_models::{
    BoundingBox, Coordinate, NeighbourhoodRecord, Polygon, PolygonPart, Ring,
};

use crate::NeighbourhoodError;

/// Minimum number of distinct vertices a ring needs to enclose an area.
const MIN_RING_VERTICES: usize = 3;

/// Validated neighbourhood polygons in insertion order.
///
/// Built once and never mutated afterwards, so it can be shared freely
/// between concurrent readers.
#[derive(Debug, Clone)]
pub struct PolygonStore {
    polygons: Vec<Polygon>,
    index_by_id: BTreeMap<i64, usize>,
}

impl PolygonStore {
    /// Validates the records and builds the store.
    ///
    /// # Errors
    ///
    /// * [`NeighbourhoodError::DuplicateId`] if two records share an id
    /// * [`NeighbourhoodError::InvalidGeometry`] if a record has no rings,
    ///   a ring with fewer than 3 vertices, or a non-finite vertex
    pub fn build<I>(records: I) -> Result<Self, NeighbourhoodError>
    where
        I: IntoIterator<Item = NeighbourhoodRecord>,
    {
        let mut polygons = Vec::new();
        let mut index_by_id = BTreeMap::new();

        for record in records {
            if index_by_id.contains_key(&record.id) {
                return Err(NeighbourhoodError::DuplicateId { id: record.id });
            }
            let polygon = validate(record)?;
            index_by_id.insert(polygon.id, polygons.len());
            polygons.push(polygon);
        }

        log::info!("Built polygon store with {} neighbourhoods", polygons.len());

        Ok(Self {
            polygons,
            index_by_id,
        })
    }

    /// Looks up a neighbourhood by id.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Polygon> {
        self.index_by_id.get(&id).map(|&index| &self.polygons[index])
    }

    /// All neighbourhoods, in insertion order.
    #[must_use]
    pub fn all(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Number of neighbourhoods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Whether the store holds no neighbourhoods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Union of every neighbourhood's bounding box, or `None` when empty.
    #[must_use]
    pub fn bounding_box_union(&self) -> Option<BoundingBox> {
        self.polygons
            .iter()
            .map(|polygon| polygon.bounding_box)
            .reduce(|acc, bbox| acc.union(&bbox))
    }

    /// Point to center a map on.
    ///
    /// This is the area-weighted centroid of every polygon part. When the
    /// parts have no area (or the centroid cannot be computed) the
    /// bounding-box midpoint is used instead.
    #[must_use]
    pub fn center(&self) -> Option<Coordinate> {
        let bbox = self.bounding_box_union()?;

        let multi_polygon = MultiPolygon(
            self.polygons
                .iter()
                .flat_map(|polygon| polygon.parts.iter().map(to_geo_polygon))
                .collect(),
        );

        if multi_polygon.unsigned_area() <= 0.0 {
            return Some(bbox.center());
        }

        Some(
            multi_polygon
                .centroid()
                .map_or_else(|| bbox.center(), |p| Coordinate::new(p.x(), p.y())),
        )
    }
}

fn validate(record: NeighbourhoodRecord) -> Result<Polygon, NeighbourhoodError> {
    let id = record.id;
    let invalid = |reason: String| NeighbourhoodError::InvalidGeometry { id, reason };

    if record.parts.is_empty() {
        return Err(invalid("no rings".to_string()));
    }

    let mut parts = Vec::with_capacity(record.parts.len());
    for (part_index, rings) in record.parts.into_iter().enumerate() {
        let mut rings = rings.into_iter();
        let Some(exterior) = rings.next() else {
            return Err(invalid(format!("part {part_index} has no rings")));
        };
        let holes: Vec<Ring> = rings.collect();

        for (ring_index, ring) in std::iter::once(&exterior).chain(&holes).enumerate() {
            let count = ring.distinct_vertex_count();
            if count < MIN_RING_VERTICES {
                return Err(invalid(format!(
                    "part {part_index} ring {ring_index} has {count} vertices, \
                     need at least {MIN_RING_VERTICES}"
                )));
            }
            if ring
                .vertices()
                .iter()
                .any(|c| !c.longitude.is_finite() || !c.latitude.is_finite())
            {
                return Err(invalid(format!(
                    "part {part_index} ring {ring_index} has a non-finite vertex"
                )));
            }
        }

        let Some(bounding_box) = BoundingBox::from_coordinates(exterior.vertices()) else {
            return Err(invalid(format!("part {part_index} has an empty exterior")));
        };

        parts.push(PolygonPart {
            exterior,
            holes,
            bounding_box,
        });
    }

    let bounding_box = parts
        .iter()
        .map(|part| part.bounding_box)
        .reduce(|acc, bbox| acc.union(&bbox))
        .ok_or_else(|| invalid("no parts".to_string()))?;

    Ok(Polygon {
        id,
        name: record.name,
        parts,
        attributes: record.attributes,
        bounding_box,
    })
}

fn to_geo_polygon(part: &PolygonPart) -> geo::Polygon<f64> {
    geo::Polygon::new(
        to_line_string(&part.exterior),
        part.holes.iter().map(to_line_string).collect(),
    )
}

fn to_line_string(ring: &Ring) -> LineString<f64> {
    ring.vertices()
        .iter()
        .map(|c| (c.longitude, c.latitude))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(id: i64, x0: f64, y0: f64, size: f64) -> NeighbourhoodRecord {
        NeighbourhoodRecord {
            id,
            name: format!("Neighbourhood {id}"),
            parts: vec![vec![Ring::from(vec![
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
            ])]],
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn keeps_insertion_order_and_lookup() {
        let store = PolygonStore::build(vec![
            square(7, 0.0, 0.0, 1.0),
            square(3, 1.0, 0.0, 1.0),
            square(5, 2.0, 0.0, 1.0),
        ])
        .unwrap();

        let ids: Vec<i64> = store.all().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![7, 3, 5]);
        assert_eq!(store.get(3).unwrap().name, "Neighbourhood 3");
        assert!(store.get(4).is_none());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err =
            PolygonStore::build(vec![square(1, 0.0, 0.0, 1.0), square(1, 1.0, 0.0, 1.0)])
                .unwrap_err();
        assert!(matches!(err, NeighbourhoodError::DuplicateId { id: 1 }));
    }

    #[test]
    fn rejects_record_without_rings() {
        let mut record = square(1, 0.0, 0.0, 1.0);
        record.parts.clear();
        let err = PolygonStore::build(vec![record]).unwrap_err();
        assert!(matches!(err, NeighbourhoodError::InvalidGeometry { id: 1, .. }));

        let mut record = square(2, 0.0, 0.0, 1.0);
        record.parts = vec![Vec::new()];
        let err = PolygonStore::build(vec![record]).unwrap_err();
        assert!(matches!(err, NeighbourhoodError::InvalidGeometry { id: 2, .. }));
    }

    #[test]
    fn rejects_short_rings() {
        let mut record = square(1, 0.0, 0.0, 1.0);
        record.parts[0].push(Ring::from(vec![(0.2, 0.2), (0.4, 0.4), (0.2, 0.2)]));
        let err = PolygonStore::build(vec![record]).unwrap_err();
        assert!(matches!(err, NeighbourhoodError::InvalidGeometry { id: 1, .. }));
    }

    #[test]
    fn bounding_box_union_covers_all_polygons() {
        let store =
            PolygonStore::build(vec![square(1, 0.0, 0.0, 1.0), square(2, 3.0, -2.0, 1.0)])
                .unwrap();
        assert_eq!(
            store.bounding_box_union().unwrap(),
            BoundingBox::new(0.0, -2.0, 4.0, 1.0)
        );
    }

    #[test]
    fn empty_store_has_no_center() {
        let store = PolygonStore::build(Vec::new()).unwrap();
        assert!(store.is_empty());
        assert!(store.bounding_box_union().is_none());
        assert!(store.center().is_none());
    }

    #[test]
    fn center_is_area_weighted() {
        // A 2x2 square and a 1x1 square: the bounding-box midpoint would be
        // (2.0, 1.0) but the larger square pulls the centroid left.
        let store =
            PolygonStore::build(vec![square(1, 0.0, 0.0, 2.0), square(2, 3.0, 0.0, 1.0)])
                .unwrap();
        let center = store.center().unwrap();
        let expected_x = (4.0 * 1.0 + 1.0 * 3.5) / 5.0;
        let expected_y = (4.0 * 1.0 + 1.0 * 0.5) / 5.0;
        assert!((center.longitude - expected_x).abs() < 1e-9);
        assert!((center.latitude - expected_y).abs() < 1e-9);
    }
}
