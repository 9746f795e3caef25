#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation and classification result types.
//!
//! These are the values handed to whatever renders the map: a count and
//! top-type breakdown per neighbourhood, and an ordinal color class per
//! neighbourhood.

use std::collections::BTreeMap;

use incident_map_incident_models::IncidentAttribute;
use serde::{Deserialize, Serialize};

/// Default number of entries in a per-neighbourhood breakdown.
pub const DEFAULT_TOP_K: usize = 5;

/// Default number of choropleth classes.
pub const DEFAULT_NUM_CLASSES: usize = 6;

/// Options for [`AggregationResult`] construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AggregateOptions {
    /// Maximum number of sub-categories reported per neighbourhood.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Attribute the breakdown groups by.
    #[serde(default = "default_breakdown")]
    pub breakdown: IncidentAttribute,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            breakdown: default_breakdown(),
        }
    }
}

const fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

const fn default_breakdown() -> IncidentAttribute {
    IncidentAttribute::TypeGroup
}

/// One row of a neighbourhood's top-K breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeShare {
    /// Sub-category label.
    pub label: String,
    /// Number of matching incidents with this label.
    pub count: u64,
    /// `100 * count / total` for the neighbourhood, or 0 when the total
    /// is 0.
    pub percentage: f64,
}

/// Aggregated incidents for one neighbourhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighbourhoodSummary {
    /// Neighbourhood id.
    pub id: i64,
    /// Neighbourhood display name.
    pub name: String,
    /// Number of incidents that passed the filter. Zero, never absent.
    pub count: u64,
    /// Most frequent sub-categories, descending by count then ascending
    /// by label.
    pub top_types: Vec<TypeShare>,
}

/// Per-neighbourhood counts for every neighbourhood in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    /// One entry per neighbourhood, in store order.
    pub neighbourhoods: Vec<NeighbourhoodSummary>,
    /// Incidents considered, including unassigned ones.
    pub total_incidents: u64,
    /// Incidents that passed the filter, including unassigned ones.
    pub matched_incidents: u64,
    /// Incidents that passed the filter but lie in no neighbourhood.
    pub unassigned_incidents: u64,
}

impl AggregationResult {
    /// Looks up a neighbourhood's summary.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&NeighbourhoodSummary> {
        self.neighbourhoods.iter().find(|summary| summary.id == id)
    }

    /// Count per neighbourhood id.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<i64, u64> {
        self.neighbourhoods
            .iter()
            .map(|summary| (summary.id, summary.count))
            .collect()
    }
}

/// How class boundaries were derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    /// Variance-minimizing natural breaks over the distinct counts.
    NaturalBreaks,
    /// Equal-width intervals over `[min, max]`.
    EqualInterval,
    /// Every count is equal, so everything is in class 0.
    SingleClass,
}

/// Ordinal color class per neighbourhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// How the breaks were computed.
    pub method: ClassificationMethod,
    /// Number of classes requested.
    pub num_classes: usize,
    /// Class edges, low to high: `breaks[0]` is the minimum count and
    /// `breaks[i + 1]` is the upper bound of class `i`.
    pub breaks: Vec<f64>,
    /// Class index per neighbourhood id, in `0..num_classes`.
    pub classes: BTreeMap<i64, usize>,
}

impl ClassificationResult {
    /// Class of a neighbourhood.
    #[must_use]
    pub fn class_of(&self, id: i64) -> Option<usize> {
        self.classes.get(&id).copied()
    }
}
