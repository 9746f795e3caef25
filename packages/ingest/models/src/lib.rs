#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset definition schema.
//!
//! A dataset pairs one neighbourhood polygon file with one incident CSV per
//! data vintage. Vintages may be published in different coordinate frames,
//! so each one names its own [`SourceFrame`].

use incident_map_analytics_models::{AggregateOptions, DEFAULT_NUM_CLASSES};
use incident_map_incident_models::FilterMode;
use incident_map_neighborhood_models::NeighbourhoodFieldMapping;
use incident_map_projection::SourceFrame;
use serde::{Deserialize, Serialize};

/// A complete, config-driven dataset definition.
///
/// Loaded from TOML files embedded at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDefinition {
    /// Unique identifier (e.g., `"edmonton"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Where the neighbourhood polygons come from.
    pub neighbourhoods: NeighbourhoodSource,
    /// Column names in the incident CSVs.
    pub columns: ColumnMapping,
    /// One entry per data year.
    pub vintages: Vec<VintageDefinition>,
    /// Filter mode used when a request does not pick one.
    #[serde(default)]
    pub filter_mode: FilterMode,
    /// Number of choropleth classes.
    #[serde(default = "default_num_classes")]
    pub num_classes: usize,
    /// Per-neighbourhood breakdown settings.
    #[serde(default)]
    pub aggregate: AggregateOptions,
}

impl DatasetDefinition {
    /// Looks up a vintage by year.
    #[must_use]
    pub fn vintage(&self, year: u16) -> Option<&VintageDefinition> {
        self.vintages.iter().find(|v| v.year == year)
    }

    /// The most recent vintage.
    #[must_use]
    pub fn latest_vintage(&self) -> Option<&VintageDefinition> {
        self.vintages.iter().max_by_key(|v| v.year)
    }

    /// All vintage years, ascending.
    #[must_use]
    pub fn years(&self) -> Vec<u16> {
        let mut years: Vec<u16> = self.vintages.iter().map(|v| v.year).collect();
        years.sort_unstable();
        years
    }
}

const fn default_num_classes() -> usize {
    DEFAULT_NUM_CLASSES
}

/// Location and field mapping of the neighbourhood polygon file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighbourhoodSource {
    /// `GeoJSON` file path, relative to the data directory.
    pub path: String,
    /// Property names and vertex frame.
    pub fields: NeighbourhoodFieldMapping,
}

/// Incident CSV column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Column holding the raw x coordinate.
    pub x: String,
    /// Column holding the raw y coordinate.
    pub y: String,
    /// Column holding the occurrence category.
    pub category: String,
    /// Column holding the occurrence group.
    pub group: String,
    /// Column holding the occurrence type group.
    pub type_group: String,
}

/// One year of incident data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VintageDefinition {
    /// Data year.
    pub year: u16,
    /// CSV file path, relative to the data directory.
    pub path: String,
    /// Frame the x/y columns are expressed in (e.g. `"EPSG:3776"`).
    pub frame: SourceFrame,
}

/// Counts from reading one incident file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Data rows read.
    pub read: u64,
    /// Rows skipped because their coordinates could not be parsed or
    /// converted.
    pub rejected: u64,
}

impl IngestReport {
    /// Rows that produced an incident.
    #[must_use]
    pub const fn accepted(&self) -> u64 {
        self.read.saturating_sub(self.rejected)
    }
}
