//! The read-only map context shared by every request.

use std::collections::BTreeMap;
use std::path::Path;

use geojson::FeatureCollection;
use incident_map_analytics::{aggregate, classify};
use incident_map_incident_models::{IncidentPoint, JoinedIncident};
use incident_map_ingest::{load_neighbourhoods, load_vintage};
use incident_map_ingest_models::{DatasetDefinition, IngestReport};
use incident_map_neighborhood::PolygonStore;
use incident_map_neighborhood_models::Coordinate;
use incident_map_projection::SourceFrame;
use incident_map_spatial::{join, unassigned};

use crate::{ChoroplethError, render};
use crate::view::{
    AvailableValues, ChoroplethEntry, ChoroplethRequest, ChoroplethView, Diagnostics,
};

/// One year of joined incidents.
#[derive(Debug, Clone)]
pub struct VintageData {
    /// Data year.
    pub year: u16,
    /// Frame the raw incident coordinates were read in.
    pub frame: SourceFrame,
    /// Row counts from reading the incident file.
    pub report: IngestReport,
    /// Every incident, each tagged with its neighbourhood (if any).
    pub joined: Vec<JoinedIncident>,
    /// Selectable attribute values among assigned incidents.
    pub available: AvailableValues,
}

impl VintageData {
    /// Joins `points` against `store`.
    #[must_use]
    pub fn new(
        year: u16,
        frame: SourceFrame,
        points: &[IncidentPoint],
        report: IngestReport,
        store: &PolygonStore,
    ) -> Self {
        let joined = join(points, store);
        let unassigned_count = unassigned(&joined).count();
        log::info!(
            "{year}: joined {} incidents, {unassigned_count} outside every neighbourhood",
            joined.len()
        );

        let available = AvailableValues::from_joined(&joined);

        Self {
            year,
            frame,
            report,
            joined,
            available,
        }
    }

    /// Incidents the join placed in no neighbourhood.
    #[must_use]
    pub fn unassigned_count(&self) -> u64 {
        unassigned(&self.joined).count() as u64
    }
}

/// A dataset loaded into memory: neighbourhood polygons plus every
/// vintage's joined incidents.
///
/// Built once, then only read. Wrap it in an `Arc` to share it between
/// request handlers.
#[derive(Debug, Clone)]
pub struct MapContext {
    dataset: DatasetDefinition,
    store: PolygonStore,
    center: Option<Coordinate>,
    vintages: BTreeMap<u16, VintageData>,
}

impl MapContext {
    /// Loads the dataset's polygons and every vintage from `data_dir`.
    ///
    /// # Errors
    ///
    /// * If the polygon file is missing or invalid
    /// * If any vintage's incident file is missing or lacks a mapped column
    pub fn load(dataset: DatasetDefinition, data_dir: &Path) -> Result<Self, ChoroplethError> {
        let store = load_neighbourhoods(&dataset, data_dir)?;

        let mut vintages = BTreeMap::new();
        for year in dataset.years() {
            let (points, report) = load_vintage(&dataset, year, data_dir)?;
            let frame = dataset
                .vintage(year)
                .map_or(SourceFrame::Geographic, |v| v.frame);
            vintages.insert(year, VintageData::new(year, frame, &points, report, &store));
        }

        Ok(Self::from_parts(dataset, store, vintages))
    }

    /// Assembles a context from already-loaded parts.
    #[must_use]
    pub fn from_parts(
        dataset: DatasetDefinition,
        store: PolygonStore,
        vintages: BTreeMap<u16, VintageData>,
    ) -> Self {
        let center = store.center();
        log::info!(
            "Map context for {} ready: {} neighbourhoods, vintages {:?}",
            dataset.id,
            store.len(),
            vintages.keys().collect::<Vec<_>>()
        );

        Self {
            dataset,
            store,
            center,
            vintages,
        }
    }

    /// The dataset definition.
    #[must_use]
    pub const fn dataset(&self) -> &DatasetDefinition {
        &self.dataset
    }

    /// The neighbourhood polygons.
    #[must_use]
    pub const fn store(&self) -> &PolygonStore {
        &self.store
    }

    /// Point to center the map on.
    #[must_use]
    pub const fn center(&self) -> Option<Coordinate> {
        self.center
    }

    /// Loaded years, ascending.
    #[must_use]
    pub fn years(&self) -> Vec<u16> {
        self.vintages.keys().copied().collect()
    }

    /// The most recent loaded year.
    #[must_use]
    pub fn latest_year(&self) -> Option<u16> {
        self.vintages.keys().next_back().copied()
    }

    /// Looks up a loaded vintage.
    ///
    /// # Errors
    ///
    /// Returns [`ChoroplethError::UnknownVintage`] if `year` was not
    /// loaded.
    pub fn vintage(&self, year: u16) -> Result<&VintageData, ChoroplethError> {
        self.vintages
            .get(&year)
            .ok_or(ChoroplethError::UnknownVintage { year })
    }

    /// Runs filter, aggregate and classify for one request.
    ///
    /// # Errors
    ///
    /// * [`ChoroplethError::UnknownVintage`] if the requested year was not
    ///   loaded
    /// * [`ChoroplethError::NoVintages`] if no year was requested and
    ///   nothing is loaded
    pub fn choropleth(&self, request: &ChoroplethRequest) -> Result<ChoroplethView, ChoroplethError> {
        let year = match request.year {
            Some(year) => year,
            None => self.latest_year().ok_or(ChoroplethError::NoVintages)?,
        };
        let vintage = self.vintage(year)?;

        let filter = request.filter_spec(self.dataset.filter_mode);
        let aggregation = aggregate(&vintage.joined, &self.store, &filter, &self.dataset.aggregate);
        let classification = classify(&aggregation.counts(), self.dataset.num_classes);

        let counted_incidents: u64 = aggregation.neighbourhoods.iter().map(|n| n.count).sum();
        let diagnostics = Diagnostics {
            rows_read: vintage.report.read,
            rows_rejected: vintage.report.rejected,
            total_incidents: aggregation.total_incidents,
            unassigned_incidents: vintage.unassigned_count(),
            matched_incidents: aggregation.matched_incidents,
            counted_incidents,
        };

        log::debug!(
            "{} {year}: {counted_incidents} of {} incidents counted, method {:?}",
            self.dataset.id,
            aggregation.total_incidents,
            classification.method
        );

        let neighbourhoods = aggregation
            .neighbourhoods
            .into_iter()
            .map(|summary| ChoroplethEntry {
                class: classification.class_of(summary.id).unwrap_or(0),
                id: summary.id,
                name: summary.name,
                count: summary.count,
                top_types: summary.top_types,
            })
            .collect();

        Ok(ChoroplethView {
            dataset: self.dataset.id.clone(),
            year,
            center: self.center,
            filter,
            method: classification.method,
            num_classes: classification.num_classes,
            breaks: classification.breaks,
            neighbourhoods,
            available: vintage.available.clone(),
            diagnostics,
        })
    }

    /// Runs [`Self::choropleth`] and renders the result as `GeoJSON`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::choropleth`].
    pub fn choropleth_geojson(
        &self,
        request: &ChoroplethRequest,
    ) -> Result<FeatureCollection, ChoroplethError> {
        let view = self.choropleth(request)?;
        Ok(render::feature_collection(&view, &self.store))
    }
}
