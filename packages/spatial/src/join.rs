//! Spatial join of incident points against the neighbourhood polygons.

use incident_map_incident_models::{IncidentPoint, JoinedIncident};
use incident_map_neighborhood::PolygonStore;
use incident_map_neighborhood_models::{Coordinate, Polygon};
use rstar::{AABB, RTree, RTreeObject};

use crate::containment::contains;

/// A polygon's bounding box in the R-tree, tagged with its store position.
struct IndexEntry {
    store_index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over a [`PolygonStore`]'s bounding boxes.
///
/// The tree only narrows the candidate set. Candidates are always tested
/// in store order, so the result is the same as scanning every polygon.
pub struct SpatialIndex<'a> {
    store: &'a PolygonStore,
    tree: RTree<IndexEntry>,
}

impl<'a> SpatialIndex<'a> {
    /// Builds the index over every polygon in the store.
    #[must_use]
    pub fn new(store: &'a PolygonStore) -> Self {
        let entries = store
            .all()
            .iter()
            .enumerate()
            .map(|(store_index, polygon)| {
                let bbox = polygon.bounding_box;
                IndexEntry {
                    store_index,
                    envelope: AABB::from_corners([bbox.west, bbox.south], [bbox.east, bbox.north]),
                }
            })
            .collect();

        Self {
            store,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Finds the polygon containing the point.
    ///
    /// Where polygons overlap, the one that comes first in store order
    /// wins.
    #[must_use]
    pub fn lookup(&self, point: &Coordinate) -> Option<&'a Polygon> {
        let query_env = AABB::from_point([point.longitude, point.latitude]);

        let mut candidates: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_env)
            .map(|entry| entry.store_index)
            .collect();
        candidates.sort_unstable();

        let polygons = self.store.all();
        candidates
            .into_iter()
            .map(|index| &polygons[index])
            .find(|polygon| contains(point, polygon))
    }
}

/// Joins every point against the store.
///
/// Points that fall in no polygon are kept with `neighbourhood_id: None`.
/// Neither input is modified.
#[must_use]
pub fn join(points: &[IncidentPoint], store: &PolygonStore) -> Vec<JoinedIncident> {
    let index = SpatialIndex::new(store);

    let joined: Vec<JoinedIncident> = points
        .iter()
        .map(|point| {
            let coordinate = Coordinate::new(point.longitude, point.latitude);
            JoinedIncident {
                point: point.clone(),
                neighbourhood_id: index.lookup(&coordinate).map(|polygon| polygon.id),
            }
        })
        .collect();

    let unassigned_count = unassigned(&joined).count();
    if unassigned_count > 0 {
        log::debug!(
            "{unassigned_count} of {} incidents fell outside every neighbourhood",
            joined.len()
        );
    }

    joined
}

/// Incidents the join could not place in any neighbourhood.
pub fn unassigned(joined: &[JoinedIncident]) -> impl Iterator<Item = &JoinedIncident> {
    joined.iter().filter(|incident| !incident.is_assigned())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use incident_map_incident_models::IncidentRecord;
    use incident_map_neighborhood_models::{NeighbourhoodRecord, Ring};
    use incident_map_projection::SourceFrame;

    use super::*;

    fn square(id: i64, x0: f64, y0: f64, size: f64) -> NeighbourhoodRecord {
        NeighbourhoodRecord {
            id,
            name: format!("N{id}"),
            parts: vec![vec![Ring::from(vec![
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
            ])]],
            attributes: BTreeMap::new(),
        }
    }

    fn point(longitude: f64, latitude: f64) -> IncidentPoint {
        IncidentPoint {
            record: IncidentRecord {
                x: longitude,
                y: latitude,
                frame: SourceFrame::Geographic,
                category: "Property".to_string(),
                group: "Theft".to_string(),
                type_group: "Theft From Vehicle".to_string(),
                extra: BTreeMap::new(),
            },
            longitude,
            latitude,
        }
    }

    /// Three unit squares: 1 at (0,0), 2 at (1,0), 3 at (0,1). The fourth
    /// cell of the 2x2 grid, (1,1), is not covered.
    fn grid_store() -> PolygonStore {
        PolygonStore::build(vec![
            square(1, 0.0, 0.0, 1.0),
            square(2, 1.0, 0.0, 1.0),
            square(3, 0.0, 1.0, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn assigns_points_and_keeps_unassigned() {
        let store = grid_store();
        let points = vec![
            point(0.2, 0.2),
            point(0.8, 0.2),
            point(0.2, 0.8),
            point(0.5, 0.5),
            point(1.2, 0.2),
            point(1.5, 0.5),
            point(1.8, 0.8),
            point(1.5, 1.5),
            point(-1.0, 0.5),
            point(3.0, 3.0),
        ];

        let joined = join(&points, &store);
        assert_eq!(joined.len(), points.len());

        let count = |id: i64| {
            joined
                .iter()
                .filter(|j| j.neighbourhood_id == Some(id))
                .count()
        };
        assert_eq!(count(1), 4);
        assert_eq!(count(2), 3);
        assert_eq!(count(3), 0);
        assert_eq!(unassigned(&joined).count(), 3);
    }

    #[test]
    fn overlapping_polygons_resolve_to_first_in_store_order() {
        let store = PolygonStore::build(vec![
            square(20, 0.0, 0.0, 2.0),
            square(10, 1.0, 1.0, 2.0),
        ])
        .unwrap();
        let index = SpatialIndex::new(&store);
        assert_eq!(index.lookup(&Coordinate::new(1.5, 1.5)).unwrap().id, 20);
        assert_eq!(index.lookup(&Coordinate::new(2.5, 2.5)).unwrap().id, 10);

        let reversed = PolygonStore::build(vec![
            square(10, 1.0, 1.0, 2.0),
            square(20, 0.0, 0.0, 2.0),
        ])
        .unwrap();
        let index = SpatialIndex::new(&reversed);
        assert_eq!(index.lookup(&Coordinate::new(1.5, 1.5)).unwrap().id, 10);
    }

    #[test]
    fn join_does_not_modify_inputs() {
        let store = grid_store();
        let points = vec![point(0.5, 0.5), point(5.0, 5.0)];
        let before = points.clone();
        let first = join(&points, &store);
        let second = join(&points, &store);
        assert_eq!(points, before);
        assert_eq!(first, second);
    }
}
