#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the incident map engine.
//!
//! Loads a dataset from the data directory, builds one choropleth view and
//! prints it as JSON (or as a `GeoJSON` `FeatureCollection`) on stdout.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use incident_map_choropleth::{ChoroplethRequest, MapContext};
use incident_map_incident_models::{FilterMode, IncidentAttribute};
use incident_map_ingest::{all_datasets, dataset, paths};

/// Neighbourhood incident choropleths from open crime data.
#[derive(Parser)]
#[command(name = "incident_map")]
#[command(about = "Neighbourhood incident choropleths from open crime data")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the embedded dataset definitions.
    Datasets,

    /// Build a choropleth for one year and print it.
    Summary {
        /// Dataset id.
        #[arg(long, default_value = "edmonton")]
        dataset: String,

        /// Data directory. Defaults to `INCIDENT_MAP_DATA_DIR` or `data/`.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Data year. Defaults to the latest year.
        #[arg(long)]
        year: Option<u16>,

        /// Which selections apply. Defaults to the dataset's mode.
        #[arg(long, value_enum)]
        filter_by: Option<FilterByArg>,

        /// Selected category (repeatable).
        #[arg(long = "category")]
        categories: Vec<String>,

        /// Selected group (repeatable).
        #[arg(long = "group")]
        groups: Vec<String>,

        /// Selected type group (repeatable).
        #[arg(long = "type-group")]
        type_groups: Vec<String>,

        /// Print a `GeoJSON` `FeatureCollection` instead of the view.
        #[arg(long)]
        geojson: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterByArg {
    Categories,
    Groups,
    TypeGroups,
    All,
}

impl From<FilterByArg> for FilterMode {
    fn from(value: FilterByArg) -> Self {
        let attribute = match value {
            FilterByArg::Categories => IncidentAttribute::Category,
            FilterByArg::Groups => IncidentAttribute::Group,
            FilterByArg::TypeGroups => IncidentAttribute::TypeGroup,
            FilterByArg::All => return Self::Simultaneous,
        };
        Self::Exclusive { attribute }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();

    match cli.command {
        Commands::Datasets => {
            for definition in all_datasets() {
                println!(
                    "{:<12} {} ({})",
                    definition.id,
                    definition.name,
                    definition
                        .years()
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
        Commands::Summary {
            dataset: dataset_id,
            data_dir,
            year,
            filter_by,
            categories,
            groups,
            type_groups,
            geojson,
        } => {
            let data_dir = data_dir.unwrap_or_else(paths::data_dir);
            let definition = dataset(&dataset_id)?;

            log::info!("Loading {dataset_id} from {}", data_dir.display());
            let context = MapContext::load(definition, &data_dir)?;

            let mut request = ChoroplethRequest::for_year(year);
            if let Some(filter_by) = filter_by {
                request = request.with_mode(filter_by.into());
            }
            for (attribute, values) in [
                (IncidentAttribute::Category, categories),
                (IncidentAttribute::Group, groups),
                (IncidentAttribute::TypeGroup, type_groups),
            ] {
                if !values.is_empty() {
                    request = request.with_selection(attribute, values);
                }
            }

            let output = if geojson {
                serde_json::to_string_pretty(&context.choropleth_geojson(&request)?)?
            } else {
                serde_json::to_string_pretty(&context.choropleth(&request)?)?
            };
            println!("{output}");
        }
    }

    Ok(())
}
