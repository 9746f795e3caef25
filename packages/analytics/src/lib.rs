#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident filtering, aggregation and choropleth classification.
//!
//! [`aggregate`] turns joined incidents and a filter selection into a
//! count (and top-K breakdown) for every neighbourhood. [`classify`] bins
//! those counts into ordered color classes, using natural breaks when
//! there are enough distinct values and equal intervals otherwise.

pub mod aggregate;
pub mod classify;

pub use aggregate::aggregate;
pub use classify::classify;
