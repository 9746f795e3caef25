#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighbourhood polygon types.
//!
//! Polygons and multi-polygons are represented uniformly: a neighbourhood
//! is one or more [`PolygonPart`]s, each an outer ring plus zero or more
//! holes. All coordinates are geographic longitude/latitude degrees.

use std::collections::BTreeMap;

use incident_map_projection::SourceFrame;
use serde::{Deserialize, Serialize};

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude (x).
    pub longitude: f64,
    /// Latitude (y).
    pub latitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from longitude and latitude.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((longitude, latitude): (f64, f64)) -> Self {
        Self::new(longitude, latitude)
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Smallest box containing every coordinate, or `None` when empty.
    #[must_use]
    pub fn from_coordinates<'a, I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        coordinates.into_iter().fold(None, |acc, c| {
            let point = Self::new(c.longitude, c.latitude, c.longitude, c.latitude);
            Some(acc.map_or(point, |b: Self| b.union(&point)))
        })
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }

    /// Whether the point lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        point.longitude >= self.west
            && point.longitude <= self.east
            && point.latitude >= self.south
            && point.latitude <= self.north
    }

    /// Midpoint of the box.
    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            f64::midpoint(self.west, self.east),
            f64::midpoint(self.south, self.north),
        )
    }
}

/// An ordered sequence of vertices. The last vertex implicitly connects
/// back to the first; an explicit closing vertex is allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ring(pub Vec<Coordinate>);

impl Ring {
    /// The ring's vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Coordinate] {
        &self.0
    }

    /// Number of distinct vertices, not counting an explicit closing
    /// vertex that repeats the first.
    #[must_use]
    pub fn distinct_vertex_count(&self) -> usize {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) if self.0.len() > 1 && first == last => self.0.len() - 1,
            _ => self.0.len(),
        }
    }
}

impl From<Vec<(f64, f64)>> for Ring {
    fn from(vertices: Vec<(f64, f64)>) -> Self {
        Self(vertices.into_iter().map(Coordinate::from).collect())
    }
}

/// One connected piece of a neighbourhood: an outer ring and its holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonPart {
    /// Outer boundary.
    pub exterior: Ring,
    /// Rings cut out of the exterior.
    pub holes: Vec<Ring>,
    /// Bounding box of the exterior ring.
    pub bounding_box: BoundingBox,
}

/// A raw neighbourhood record as extracted from a polygon source, before
/// validation.
///
/// Each entry in `parts` is a list of rings: the first is the outer
/// boundary and any further rings are holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighbourhoodRecord {
    /// Unique neighbourhood identifier.
    pub id: i64,
    /// Human-readable name used for display.
    pub name: String,
    /// Rings grouped by part.
    pub parts: Vec<Vec<Ring>>,
    /// Other descriptive attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// A validated neighbourhood polygon held by the polygon store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Unique neighbourhood identifier.
    pub id: i64,
    /// Human-readable name used for display.
    pub name: String,
    /// One or more parts.
    pub parts: Vec<PolygonPart>,
    /// Other descriptive attributes.
    pub attributes: BTreeMap<String, String>,
    /// Bounding box of every part.
    pub bounding_box: BoundingBox,
}

/// Property names and frame used to extract neighbourhood records from a
/// polygon source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighbourhoodFieldMapping {
    /// Property holding the integer neighbourhood id.
    pub id: String,
    /// Property holding the display name.
    pub name: String,
    /// Frame the polygon vertices are expressed in.
    #[serde(default = "default_polygon_frame")]
    pub frame: SourceFrame,
}

const fn default_polygon_frame() -> SourceFrame {
    SourceFrame::Geographic
}
