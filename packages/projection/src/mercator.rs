//! Spherical (Web) Mercator, `EPSG:3857`.

use std::f64::consts::FRAC_PI_2;

/// Radius of the sphere used by Web Mercator, in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Converts Web Mercator metres into `(longitude, latitude)` degrees.
#[must_use]
pub fn inverse(x: f64, y: f64) -> (f64, f64) {
    let longitude = (x / EARTH_RADIUS_M).to_degrees();
    let latitude = 2.0f64
        .mul_add((y / EARTH_RADIUS_M).exp().atan(), -FRAC_PI_2)
        .to_degrees();
    (longitude, latitude)
}

/// Converts `(longitude, latitude)` degrees into Web Mercator metres.
#[must_use]
pub fn forward(longitude: f64, latitude: f64) -> (f64, f64) {
    let x = EARTH_RADIUS_M * longitude.to_radians();
    let y = EARTH_RADIUS_M
        * latitude
            .to_radians()
            .mul_add(0.5, std::f64::consts::FRAC_PI_4)
            .tan()
            .ln();
    (x, y)
}
