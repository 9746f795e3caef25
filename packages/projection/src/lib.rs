#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Conversion of incident coordinates into geographic longitude/latitude.
//!
//! Incident data vintages are published in different reference frames:
//! older files use the provincial transverse Mercator grid
//! (NAD83 / Alberta 3TM ref merid 114 W, `EPSG:3776`) while newer ones use
//! spherical Web Mercator (`EPSG:3857`). Every point is normalized into
//! geographic degrees (`EPSG:4326`) before it is joined against the
//! neighbourhood polygons.
//!
//! All functions here are pure and safe to call concurrently.

pub mod mercator;
pub mod transverse_mercator;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transverse_mercator::TransverseMercator;

/// Errors that can occur while converting coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// The named reference frame is not one this crate can convert from.
    #[error("Unsupported reference frame: {frame}")]
    UnsupportedFrame {
        /// The frame identifier as supplied.
        frame: String,
    },

    /// An input or output coordinate was NaN or infinite.
    #[error("Non-finite coordinate ({x}, {y}) in {frame}")]
    NonFiniteCoordinate {
        /// The offending x value.
        x: f64,
        /// The offending y value.
        y: f64,
        /// Frame the coordinate was expressed in.
        frame: SourceFrame,
    },
}

/// A supported source reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SourceFrame {
    /// Geographic longitude/latitude in degrees (`EPSG:4326`).
    Geographic,
    /// NAD83 / Alberta 3TM ref merid 114 W (`EPSG:3776`), metres.
    Alberta3Tm114,
    /// Spherical Web Mercator (`EPSG:3857`), metres.
    WebMercator,
}

impl SourceFrame {
    /// Returns the EPSG code of this frame.
    #[must_use]
    pub const fn epsg(self) -> u32 {
        match self {
            Self::Geographic => 4326,
            Self::Alberta3Tm114 => 3776,
            Self::WebMercator => 3857,
        }
    }

    /// Looks up a frame by EPSG code.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::UnsupportedFrame`] for any code other
    /// than 4326, 3776 or 3857.
    pub fn from_epsg(code: u32) -> Result<Self, ProjectionError> {
        match code {
            4326 => Ok(Self::Geographic),
            3776 => Ok(Self::Alberta3Tm114),
            3857 => Ok(Self::WebMercator),
            _ => Err(ProjectionError::UnsupportedFrame {
                frame: format!("EPSG:{code}"),
            }),
        }
    }
}

impl fmt::Display for SourceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for SourceFrame {
    type Err = ProjectionError;

    /// Parses `"EPSG:3776"`, `"epsg:3776"` or a bare `"3776"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code = trimmed
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("epsg:"))
            .map_or(trimmed, |_| &trimmed[5..]);

        code.trim()
            .parse::<u32>()
            .map_err(|_| ProjectionError::UnsupportedFrame {
                frame: s.to_string(),
            })
            .and_then(Self::from_epsg)
    }
}

impl TryFrom<String> for SourceFrame {
    type Error = ProjectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SourceFrame> for String {
    fn from(frame: SourceFrame) -> Self {
        frame.to_string()
    }
}

/// Converts a point from `frame` into geographic `(longitude, latitude)`
/// degrees.
///
/// # Errors
///
/// Returns [`ProjectionError::NonFiniteCoordinate`] if the input or the
/// converted output is NaN or infinite.
pub fn transform(x: f64, y: f64, frame: SourceFrame) -> Result<(f64, f64), ProjectionError> {
    ensure_finite(x, y, frame)?;

    let (longitude, latitude) = match frame {
        SourceFrame::Geographic => (x, y),
        SourceFrame::Alberta3Tm114 => TransverseMercator::ALBERTA_3TM_114.inverse(x, y),
        SourceFrame::WebMercator => mercator::inverse(x, y),
    };

    ensure_finite(longitude, latitude, frame)?;
    Ok((longitude, latitude))
}

/// Converts geographic `(longitude, latitude)` degrees into `frame`.
///
/// This is the inverse of [`transform`].
///
/// # Errors
///
/// Returns [`ProjectionError::NonFiniteCoordinate`] if the input or the
/// converted output is NaN or infinite.
pub fn to_projected(
    longitude: f64,
    latitude: f64,
    frame: SourceFrame,
) -> Result<(f64, f64), ProjectionError> {
    ensure_finite(longitude, latitude, SourceFrame::Geographic)?;

    let (x, y) = match frame {
        SourceFrame::Geographic => (longitude, latitude),
        SourceFrame::Alberta3Tm114 => {
            TransverseMercator::ALBERTA_3TM_114.forward(longitude, latitude)
        }
        SourceFrame::WebMercator => mercator::forward(longitude, latitude),
    };

    ensure_finite(x, y, frame)?;
    Ok((x, y))
}

fn ensure_finite(x: f64, y: f64, frame: SourceFrame) -> Result<(), ProjectionError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(ProjectionError::NonFiniteCoordinate { x, y, frame })
    }
}
