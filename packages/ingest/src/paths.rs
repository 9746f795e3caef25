//! Canonical file paths for dataset inputs.
//!
//! Dataset definitions name their files relative to a data directory,
//! which defaults to the project root's `data/` directory.

use std::path::{Path, PathBuf};

/// Environment variable that overrides [`data_dir`].
pub const DATA_DIR_ENV: &str = "INCIDENT_MAP_DATA_DIR";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

/// Returns the data directory: `$INCIDENT_MAP_DATA_DIR` if set and
/// non-empty, else `<project root>/data`.
#[must_use]
pub fn data_dir() -> PathBuf {
    resolve_data_dir(std::env::var(DATA_DIR_ENV).ok())
}

fn resolve_data_dir(override_dir: Option<String>) -> PathBuf {
    match override_dir {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => project_root().join("data"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_root_contains_packages() {
        assert!(project_root().join("packages").is_dir());
    }

    #[test]
    fn override_wins_over_default() {
        assert_eq!(
            resolve_data_dir(Some("/srv/incidents".to_string())),
            PathBuf::from("/srv/incidents")
        );
        assert_eq!(resolve_data_dir(None), project_root().join("data"));
        assert_eq!(
            resolve_data_dir(Some("  ".to_string())),
            project_root().join("data")
        );
    }
}
