#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighbourhood polygon store and polygon record extraction.
//!
//! Neighbourhood boundaries are read once at startup, validated, and held
//! in an immutable [`PolygonStore`] that every request reads from. The
//! [`normalize`] module turns a `GeoJSON` `FeatureCollection`
//! into raw [`NeighbourhoodRecord`](incident_map_neighborhood_models::NeighbourhoodRecord)s
//! using a configurable field mapping.

pub mod normalize;
pub mod store;

pub use store::PolygonStore;

use incident_map_projection::ProjectionError;
use thiserror::Error;

/// Errors that can occur while loading neighbourhood polygons.
#[derive(Debug, Error)]
pub enum NeighbourhoodError {
    /// Two records share the same identifier.
    #[error("Duplicate neighbourhood id {id}")]
    DuplicateId {
        /// The repeated identifier.
        id: i64,
    },

    /// A record has no rings, or a ring with fewer than 3 vertices.
    #[error("Invalid geometry for neighbourhood {id}: {reason}")]
    InvalidGeometry {
        /// Identifier of the offending record.
        id: i64,
        /// Description of what is wrong.
        reason: String,
    },

    /// A feature lacks a required property.
    #[error("Feature {feature_index} has no usable '{attribute}' property")]
    MissingAttribute {
        /// Position of the feature in its collection.
        feature_index: usize,
        /// The property that was looked up.
        attribute: String,
    },

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A polygon vertex could not be converted to geographic coordinates.
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),
}
