#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident point and filter selection types.
//!
//! An incident moves through three stages: an [`IncidentRecord`] read from
//! a raw input row, an [`IncidentPoint`] once its coordinates have been
//! converted to geographic longitude/latitude, and a [`JoinedIncident`]
//! once it has been matched against the neighbourhood polygons. Each stage
//! is immutable once produced.

use std::collections::{BTreeMap, BTreeSet};

use incident_map_projection::SourceFrame;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A categorical incident attribute that can be filtered on or broken
/// down by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentAttribute {
    /// Broadest classification (e.g. "Violent", "Property").
    Category,
    /// Mid-level grouping within a category.
    Group,
    /// Most specific grouping, used for per-neighbourhood breakdowns.
    TypeGroup,
}

impl IncidentAttribute {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Category, Self::Group, Self::TypeGroup]
    }
}

/// One observed incident as read from an input row, before any
/// coordinate conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Raw x coordinate in `frame`.
    pub x: f64,
    /// Raw y coordinate in `frame`.
    pub y: f64,
    /// Reference frame the raw coordinates are expressed in.
    pub frame: SourceFrame,
    /// Occurrence category.
    pub category: String,
    /// Occurrence group.
    pub group: String,
    /// Occurrence type group.
    pub type_group: String,
    /// Any other columns from the input row, keyed by column name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl IncidentRecord {
    /// Returns the value of a categorical attribute.
    #[must_use]
    pub fn attribute(&self, attribute: IncidentAttribute) -> &str {
        match attribute {
            IncidentAttribute::Category => &self.category,
            IncidentAttribute::Group => &self.group,
            IncidentAttribute::TypeGroup => &self.type_group,
        }
    }
}

/// An incident whose coordinates are in geographic longitude/latitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentPoint {
    /// The record this point was derived from.
    pub record: IncidentRecord,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
}

/// An incident after the spatial join.
///
/// `neighbourhood_id` is `None` when no neighbourhood polygon contains the
/// point. Such incidents are kept for diagnostics but never counted toward
/// any neighbourhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedIncident {
    /// The located incident.
    pub point: IncidentPoint,
    /// Id of the enclosing neighbourhood, if any.
    pub neighbourhood_id: Option<i64>,
}

impl JoinedIncident {
    /// Returns the value of a categorical attribute.
    #[must_use]
    pub fn attribute(&self, attribute: IncidentAttribute) -> &str {
        self.point.record.attribute(attribute)
    }

    /// Whether the join found an enclosing neighbourhood.
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        self.neighbourhood_id.is_some()
    }
}

/// How the selections in a [`FilterSpec`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterMode {
    /// Only the selection on `attribute` applies. Selections on every
    /// other attribute are ignored, whatever they contain.
    Exclusive {
        /// The single attribute whose selection is honoured.
        attribute: IncidentAttribute,
    },
    /// Every non-empty selection applies and they are ANDed together.
    Simultaneous,
}

impl Default for FilterMode {
    fn default() -> Self {
        Self::Exclusive {
            attribute: IncidentAttribute::Category,
        }
    }
}

/// Selected values per categorical attribute plus the mode that decides
/// which of them apply.
///
/// An empty (or absent) selection for an attribute means "no filter on
/// that attribute", never "exclude everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// How selections combine.
    pub mode: FilterMode,
    /// Selected values per attribute.
    #[serde(default)]
    pub selections: BTreeMap<IncidentAttribute, BTreeSet<String>>,
}

impl FilterSpec {
    /// Creates a spec with no selections.
    #[must_use]
    pub const fn new(mode: FilterMode) -> Self {
        Self {
            mode,
            selections: BTreeMap::new(),
        }
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

    /// Returns the selections that take effect under the current mode,
    /// skipping empty ones.
    #[must_use]
    pub fn effective_selections(&self) -> Vec<(IncidentAttribute, &BTreeSet<String>)> {
        self.selections
            .iter()
            .filter(|(attribute, values)| {
                !values.is_empty()
                    && match self.mode {
                        FilterMode::Exclusive { attribute: active } => **attribute == active,
                        FilterMode::Simultaneous => true,
                    }
            })
            .map(|(attribute, values)| (*attribute, values))
            .collect()
    }

    /// Whether an incident passes every effective selection.
    #[must_use]
    pub fn matches(&self, record: &IncidentRecord) -> bool {
        self.effective_selections()
            .iter()
            .all(|(attribute, values)| values.contains(record.attribute(*attribute)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: &str, group: &str, type_group: &str) -> IncidentRecord {
        IncidentRecord {
            x: 0.0,
            y: 0.0,
            frame: SourceFrame::Geographic,
            category: category.to_string(),
            group: group.to_string(),
            type_group: type_group.to_string(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn empty_spec_matches_everything() {
        let spec = FilterSpec::new(FilterMode::Simultaneous);
        assert!(spec.matches(&record("Violent", "Assault", "Assault")));
    }

    #[test]
    fn empty_selection_is_not_a_filter() {
        let spec = FilterSpec::new(FilterMode::Simultaneous)
            .with_selection(IncidentAttribute::Category, Vec::<String>::new());
        assert!(spec.effective_selections().is_empty());
        assert!(spec.matches(&record("Property", "Theft", "Theft From Vehicle")));
    }

    #[test]
    fn exclusive_mode_ignores_inactive_selection() {
        let spec = FilterSpec::new(FilterMode::Exclusive {
            attribute: IncidentAttribute::TypeGroup,
        })
        .with_selection(IncidentAttribute::Category, ["Violent"])
        .with_selection(IncidentAttribute::TypeGroup, ["Break and Enter"]);

        assert!(spec.matches(&record("Property", "Theft", "Break and Enter")));
        assert!(!spec.matches(&record("Violent", "Assault", "Assault")));
    }

    #[test]
    fn simultaneous_mode_ands_selections() {
        let spec = FilterSpec::new(FilterMode::Simultaneous)
            .with_selection(IncidentAttribute::Category, ["Property"])
            .with_selection(IncidentAttribute::TypeGroup, ["Break and Enter"]);

        assert!(spec.matches(&record("Property", "Theft", "Break and Enter")));
        assert!(!spec.matches(&record("Property", "Theft", "Theft From Vehicle")));
        assert!(!spec.matches(&record("Violent", "Assault", "Break and Enter")));
    }

    #[test]
    fn attribute_names_round_trip_through_strings() {
        for attribute in IncidentAttribute::all() {
            let parsed: IncidentAttribute = attribute.to_string().parse().unwrap();
            assert_eq!(parsed, *attribute);
        }
        assert_eq!(IncidentAttribute::TypeGroup.as_ref(), "type_group");
    }

    #[test]
    fn filter_mode_deserializes_from_tagged_table() {
        let mode: FilterMode =
            serde_json::from_str(r#"{"type":"exclusive","attribute":"type_group"}"#).unwrap();
        assert_eq!(
            mode,
            FilterMode::Exclusive {
                attribute: IncidentAttribute::TypeGroup
            }
        );
    }
}
