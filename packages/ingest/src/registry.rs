//! Dataset registry. Loads all dataset definitions from embedded TOML
//! configs.
//!
//! Each `.toml` file in `packages/ingest/datasets/` is baked into the
//! binary at compile time via [`include_str!`]. Adding a dataset means
//! adding a TOML file and listing it below.

use incident_map_ingest_models::DatasetDefinition;

use crate::IngestError;

/// TOML configs embedded at compile time.
const DATASET_TOMLS: &[(&str, &str)] = &[("edmonton", include_str!("../datasets/edmonton.toml"))];

/// Total number of configured datasets (used in tests).
#[cfg(test)]
const EXPECTED_DATASET_COUNT: usize = 1;

/// Parses a dataset definition from TOML.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or does not match the schema.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, IngestError> {
    Ok(toml::from_str(toml_str)?)
}

/// Returns all configured dataset definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// the registry tests catch this before release).
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up a dataset by id.
///
/// # Errors
///
/// Returns [`IngestError::UnknownDataset`] if no embedded dataset has this
/// id.
pub fn dataset(id: &str) -> Result<DatasetDefinition, IngestError> {
    all_datasets()
        .into_iter()
        .find(|d| d.id == id)
        .ok_or_else(|| IngestError::UnknownDataset { id: id.to_string() })
}
