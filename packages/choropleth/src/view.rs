//! Request and response types for a single choropleth query.

use std::collections::{BTreeMap, BTreeSet};

use incident_map_analytics_models::{ClassificationMethod, TypeShare};
use incident_map_incident_models::{FilterMode, FilterSpec, IncidentAttribute, JoinedIncident};
use incident_map_neighborhood_models::Coordinate;
use serde::{Deserialize, Serialize};

/// What a caller asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoroplethRequest {
    /// Data year. `None` selects the latest loaded vintage.
    pub year: Option<u16>,
    /// Filter mode. `None` uses the dataset's default.
    pub mode: Option<FilterMode>,
    /// Selected values per attribute.
    #[serde(default)]
    pub selections: BTreeMap<IncidentAttribute, BTreeSet<String>>,
}

impl ChoroplethRequest {
    /// Creates a request for `year` with no selections.
    #[must_use]
    pub const fn for_year(year: Option<u16>) -> Self {
        Self {
            year,
            mode: None,
            selections: BTreeMap::new(),
        }
    }

    /// Sets the filter mode.
    #[must_use]
    pub fn with_mode(mut self, mode: FilterMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Adds values to the selection for `attribute`.
    #[must_use]
    pub fn with_selection<I, S>(mut self, attribute: IncidentAttribute, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selections
            .entry(attribute)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Resolves the request into a [`FilterSpec`], falling back to
    /// `default_mode` when no mode was given.
    #[must_use]
    pub fn filter_spec(&self, default_mode: FilterMode) -> FilterSpec {
        FilterSpec {
            mode: self.mode.unwrap_or(default_mode),
            selections: self.selections.clone(),
        }
    }
}

/// Sorted distinct attribute values among assigned incidents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableValues {
    /// Distinct categories.
    pub categories: Vec<String>,
    /// Distinct groups.
    pub groups: Vec<String>,
    /// Distinct type groups.
    pub type_groups: Vec<String>,
}

impl AvailableValues {
    /// Collects the values from incidents that landed in a neighbourhood.
    #[must_use]
    pub fn from_joined(joined: &[JoinedIncident]) -> Self {
        let distinct = |attribute: IncidentAttribute| -> Vec<String> {
            joined
                .iter()
                .filter(|incident| incident.is_assigned())
                .map(|incident| incident.attribute(attribute))
                .filter(|value| !value.is_empty())
                .collect::<BTreeSet<&str>>()
                .into_iter()
                .map(str::to_owned)
                .collect()
        };

        Self {
            categories: distinct(IncidentAttribute::Category),
            groups: distinct(IncidentAttribute::Group),
            type_groups: distinct(IncidentAttribute::TypeGroup),
        }
    }

    /// The values for one attribute.
    #[must_use]
    pub fn values(&self, attribute: IncidentAttribute) -> &[String] {
        match attribute {
            IncidentAttribute::Category => &self.categories,
            IncidentAttribute::Group => &self.groups,
            IncidentAttribute::TypeGroup => &self.type_groups,
        }
    }
}

/// Per-neighbourhood row of a [`ChoroplethView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoroplethEntry {
    /// Neighbourhood id.
    pub id: i64,
    /// Neighbourhood display name.
    pub name: String,
    /// Incidents that passed the filter.
    pub count: u64,
    /// Most frequent sub-categories.
    pub top_types: Vec<TypeShare>,
    /// Color class, in `0..num_classes`.
    pub class: usize,
}

/// Incident counts behind a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Rows read from the incident file.
    pub rows_read: u64,
    /// Rows rejected while reading (bad or unconvertible coordinates).
    pub rows_rejected: u64,
    /// Incidents that reached the join.
    pub total_incidents: u64,
    /// Incidents the join placed in no neighbourhood.
    pub unassigned_incidents: u64,
    /// Incidents that passed the filter, including unassigned ones.
    pub matched_incidents: u64,
    /// Incidents that passed the filter and were counted toward a
    /// neighbourhood.
    pub counted_incidents: u64,
}

/// Everything a renderer needs to draw one choropleth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoroplethView {
    /// Dataset id.
    pub dataset: String,
    /// Data year.
    pub year: u16,
    /// Initial map center.
    pub center: Option<Coordinate>,
    /// The filter that was applied.
    pub filter: FilterSpec,
    /// How the class breaks were computed.
    pub method: ClassificationMethod,
    /// Number of classes requested.
    pub num_classes: usize,
    /// Class edges, low to high.
    pub breaks: Vec<f64>,
    /// One entry per neighbourhood, in store order.
    pub neighbourhoods: Vec<ChoroplethEntry>,
    /// Values a caller can select from.
    pub available: AvailableValues,
    /// Incident counts.
    pub diagnostics: Diagnostics,
}

impl ChoroplethView {
    /// Looks up a neighbourhood's entry.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&ChoroplethEntry> {
        self.neighbourhoods.iter().find(|entry| entry.id == id)
    }
}
