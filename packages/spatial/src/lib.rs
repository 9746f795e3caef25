#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point-in-polygon containment and the incident spatial join.
//!
//! Each polygon's bounding box is precomputed when the store is built; the
//! join uses an R-tree over those boxes to find candidate neighbourhoods
//! and then runs the ray-casting test on each candidate in store order.

pub mod containment;
pub mod join;

pub use containment::{Containment, contains, locate};
pub use join::{SpatialIndex, join, unassigned};
