#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the incident map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the engine's own types to allow independent evolution of the API
//! contract.

use incident_map_choropleth::ChoroplethRequest;
use incident_map_incident_models::{FilterMode, IncidentAttribute};
use incident_map_ingest_models::DatasetDefinition;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

/// A loaded dataset as listed by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDataset {
    /// Dataset id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Loaded years, ascending.
    pub years: Vec<u16>,
    /// Filter mode used when a request does not pick one.
    pub default_filter_mode: FilterMode,
    /// Number of choropleth classes.
    pub num_classes: usize,
    /// Size of each neighbourhood's top-types breakdown.
    pub top_k: usize,
}

impl ApiDataset {
    /// Describes `dataset` with the years that were actually loaded.
    #[must_use]
    pub fn new(dataset: &DatasetDefinition, years: Vec<u16>) -> Self {
        Self {
            id: dataset.id.clone(),
            name: dataset.name.clone(),
            years,
            default_filter_mode: dataset.filter_mode,
            num_classes: dataset.num_classes,
            top_k: dataset.aggregate.top_k,
        }
    }
}

/// Which selections a choropleth request applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterBy {
    /// Only the category selection applies.
    Categories,
    /// Only the group selection applies.
    Groups,
    /// Only the type-group selection applies.
    TypeGroups,
    /// Every selection applies, ANDed together.
    All,
}

impl From<FilterBy> for FilterMode {
    fn from(value: FilterBy) -> Self {
        let attribute = match value {
            FilterBy::Categories => IncidentAttribute::Category,
            FilterBy::Groups => IncidentAttribute::Group,
            FilterBy::TypeGroups => IncidentAttribute::TypeGroup,
            FilterBy::All => return Self::Simultaneous,
        };
        Self::Exclusive { attribute }
    }
}

/// Response body format for the choropleth endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// The full choropleth view.
    #[default]
    Json,
    /// A `GeoJSON` `FeatureCollection`.
    Geojson,
}

/// Query parameters for the choropleth endpoint.
///
/// Selections are comma-separated lists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoroplethQueryParams {
    /// Data year. Omitted means the latest loaded year.
    pub year: Option<u16>,
    /// Filter mode. Omitted means the dataset default.
    pub filter_by: Option<FilterBy>,
    /// Selected categories.
    pub categories: Option<String>,
    /// Selected groups.
    pub groups: Option<String>,
    /// Selected type groups.
    pub type_groups: Option<String>,
    /// Response format.
    #[serde(default)]
    pub format: ResponseFormat,
}

impl ChoroplethQueryParams {
    /// Converts the query string into an engine request.
    #[must_use]
    pub fn to_request(&self) -> ChoroplethRequest {
        let mut request = ChoroplethRequest::for_year(self.year);
        if let Some(filter_by) = self.filter_by {
            request = request.with_mode(filter_by.into());
        }

        for (attribute, values) in [
            (IncidentAttribute::Category, &self.categories),
            (IncidentAttribute::Group, &self.groups),
            (IncidentAttribute::TypeGroup, &self.type_groups),
        ] {
            let values = split_list(values.as_deref());
            if !values.is_empty() {
                request = request.with_selection(attribute, values);
            }
        }

        request
    }
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
fn split_list(s: Option<&str>) -> Vec<String> {
    s.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn empty_params_use_defaults() {
        let request = ChoroplethQueryParams::default().to_request();
        assert_eq!(request, ChoroplethRequest::default());
    }

    #[test]
    fn params_become_selections() {
        let params = ChoroplethQueryParams {
            year: Some(2024),
            filter_by: Some(FilterBy::TypeGroups),
            categories: Some("Property, Violent".to_string()),
            type_groups: Some("Assault,,".to_string()),
            ..ChoroplethQueryParams::default()
        };
        let request = params.to_request();

        assert_eq!(request.year, Some(2024));
        assert_eq!(
            request.mode,
            Some(FilterMode::Exclusive {
                attribute: IncidentAttribute::TypeGroup
            })
        );
        assert_eq!(
            request.selections[&IncidentAttribute::Category],
            BTreeSet::from(["Property".to_string(), "Violent".to_string()])
        );
        assert_eq!(
            request.selections[&IncidentAttribute::TypeGroup],
            BTreeSet::from(["Assault".to_string()])
        );
        assert!(!request.selections.contains_key(&IncidentAttribute::Group));
    }

    #[test]
    fn filter_by_all_is_simultaneous() {
        assert_eq!(FilterMode::from(FilterBy::All), FilterMode::Simultaneous);
        assert_eq!(
            FilterMode::from(FilterBy::Groups),
            FilterMode::Exclusive {
                attribute: IncidentAttribute::Group
            }
        );
    }

    #[test]
    fn filter_by_deserializes_from_snake_case() {
        let filter_by: FilterBy = serde_json::from_str("\"type_groups\"").unwrap();
        assert_eq!(filter_by, FilterBy::TypeGroups);
        let format: ResponseFormat = serde_json::from_str("\"geojson\"").unwrap();
        assert_eq!(format, ResponseFormat::Geojson);
    }
}
