//! Ray-casting point-in-polygon tests.
//!
//! A horizontal ray is cast from the point towards +x and the edges it
//! crosses are counted; an odd count means inside. Edges use the half-open
//! rule `(y_i > y) != (y_j > y)` so a ray through a shared vertex is only
//! counted once, and horizontal edges never count.

use incident_map_neighborhood_models::{Coordinate, Polygon, Ring};

/// Where a point sits relative to a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// Outside the polygon's bounding box. No ring was evaluated.
    OutsideBounds,
    /// Inside the bounding box but outside every outer ring.
    Outside,
    /// Inside an outer ring but also inside one of that part's holes.
    InHole,
    /// Inside an outer ring and outside all of its holes.
    Inside,
}

/// Classifies `point` against `polygon`.
///
/// The polygon's precomputed bounding box is checked first; points outside
/// it return [`Containment::OutsideBounds`] without touching any ring.
#[must_use]
pub fn locate(point: &Coordinate, polygon: &Polygon) -> Containment {
    if !polygon.bounding_box.contains(point) {
        return Containment::OutsideBounds;
    }

    let mut in_hole = false;
    for part in &polygon.parts {
        if !part.bounding_box.contains(point) || !ring_contains(point, &part.exterior) {
            continue;
        }
        if part.holes.iter().any(|hole| ring_contains(point, hole)) {
            in_hole = true;
            continue;
        }
        return Containment::Inside;
    }

    if in_hole {
        Containment::InHole
    } else {
        Containment::Outside
    }
}

/// Whether `polygon` contains `point` (outer ring minus holes).
#[must_use]
pub fn contains(point: &Coordinate, polygon: &Polygon) -> bool {
    locate(point, polygon) == Containment::Inside
}

/// Parity test of a single ring.
#[must_use]
pub fn ring_contains(point: &Coordinate, ring: &Ring) -> bool {
    let vertices = ring.vertices();
    if vertices.len() < 3 {
        return false;
    }

    let (x, y) = (point.longitude, point.latitude);
    let mut inside = false;
    let mut j = vertices.len() - 1;

    for (i, vi) in vertices.iter().enumerate() {
        let vj = &vertices[j];
        let (xi, yi) = (vi.longitude, vi.latitude);
        let (xj, yj) = (vj.longitude, vj.latitude);

        if (yi > y) != (yj > y) {
            let dy = yj - yi;
            if dy != 0.0 {
                let crossing_x = (xj - xi).mul_add((y - yi) / dy, xi);
                if x < crossing_x {
                    inside = !inside;
                }
            }
        }
        j = i;
    }

    inside
}
