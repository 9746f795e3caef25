#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset registry and file loading.
//!
//! Datasets are described by TOML files baked into the binary (see
//! [`registry`]). Loading a dataset reads its neighbourhood polygons into a
//! [`PolygonStore`] and each vintage's incident CSV into geographic
//! [`IncidentPoint`]s.

pub mod incidents;
pub mod paths;
pub mod registry;

use std::path::Path;

use incident_map_incident_models::IncidentPoint;
use incident_map_ingest_models::{DatasetDefinition, IngestReport};
use incident_map_neighborhood::normalize::records_from_geojson;
use incident_map_neighborhood::{NeighbourhoodError, PolygonStore};
use incident_map_projection::ProjectionError;
use thiserror::Error;

pub use registry::{all_datasets, dataset};

/// Errors that can occur while loading a dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A data file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A dataset definition is malformed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A coordinate frame is not supported.
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Neighbourhood polygons could not be loaded.
    #[error("Neighbourhood error: {0}")]
    Neighbourhood(#[from] NeighbourhoodError),

    /// An incident file lacks a configured column.
    #[error("Incident file has no '{column}' column")]
    MissingColumn {
        /// The configured column name.
        column: String,
    },

    /// No embedded dataset has this id.
    #[error("Unknown dataset '{id}'")]
    UnknownDataset {
        /// The requested id.
        id: String,
    },

    /// The dataset has no vintage for this year.
    #[error("Dataset '{dataset}' has no data for {year}")]
    UnknownVintage {
        /// Dataset id.
        dataset: String,
        /// The requested year.
        year: u16,
    },
}

/// Reads and validates a dataset's neighbourhood polygons.
///
/// # Errors
///
/// * If the polygon file cannot be read
/// * If the `GeoJSON` is malformed or a feature is invalid
/// * If two features share an id
pub fn load_neighbourhoods(
    dataset: &DatasetDefinition,
    data_dir: &Path,
) -> Result<PolygonStore, IngestError> {
    let path = data_dir.join(&dataset.neighbourhoods.path);
    log::info!("Loading neighbourhoods for {} from {}", dataset.id, path.display());

    let text = read_to_string(&path)?;
    let records = records_from_geojson(&text, &dataset.neighbourhoods.fields)?;
    Ok(PolygonStore::build(records)?)
}

/// Reads one vintage's incidents and converts them to longitude/latitude.
///
/// Rows whose coordinates cannot be parsed or converted are skipped and
/// counted in the returned [`IngestReport`].
///
/// # Errors
///
/// * If the dataset has no vintage for `year`
/// * If the incident file cannot be opened
/// * If the file lacks a configured column
pub fn load_vintage(
    dataset: &DatasetDefinition,
    year: u16,
    data_dir: &Path,
) -> Result<(Vec<IncidentPoint>, IngestReport), IngestError> {
    let vintage = dataset
        .vintage(year)
        .ok_or_else(|| IngestError::UnknownVintage {
            dataset: dataset.id.clone(),
            year,
        })?;

    let path = data_dir.join(&vintage.path);
    log::info!(
        "Loading {} incidents for {year} ({}) from {}",
        dataset.id,
        vintage.frame,
        path.display()
    );

    let file = std::fs::File::open(&path).map_err(|source| io_error(&path, source))?;
    let (points, report) = incidents::read_incidents(file, &dataset.columns, vintage.frame)?;

    log::info!(
        "{year}: read {} rows, rejected {}",
        report.read,
        report.rejected
    );

    Ok((points, report))
}

fn read_to_string(path: &Path) -> Result<String, IngestError> {
    std::fs::read_to_string(path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> IngestError {
    IngestError::Io {
        path: path.display().to_string(),
        source,
    }
}
