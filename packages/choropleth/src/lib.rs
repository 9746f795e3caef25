#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Choropleth views over a loaded dataset.
//!
//! A [`MapContext`] is built once at startup: the neighbourhood polygons
//! are loaded, every vintage's incidents are read and spatially joined,
//! and the result is kept read-only. Each request then runs
//! filter, aggregate and classify against it to produce a
//! [`ChoroplethView`], which can be rendered as a `GeoJSON`
//! `FeatureCollection` for an external map renderer.

pub mod context;
pub mod render;
pub mod view;

pub use context::{MapContext, VintageData};
pub use view::{AvailableValues, ChoroplethEntry, ChoroplethRequest, ChoroplethView, Diagnostics};

use incident_map_ingest::IngestError;
use thiserror::Error;

/// Errors from building or querying a [`MapContext`].
#[derive(Debug, Error)]
pub enum ChoroplethError {
    /// No data was loaded for the requested year.
    #[error("No data loaded for {year}")]
    UnknownVintage {
        /// The requested year.
        year: u16,
    },

    /// The context has no vintages at all.
    #[error("No vintages loaded")]
    NoVintages,

    /// Loading the dataset failed.
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),
}
