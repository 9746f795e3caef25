//! Ellipsoidal transverse Mercator using the sixth-order Krüger series.
//!
//! Accurate to well under a millimetre within a few thousand kilometres of
//! the central meridian, which covers every provincial 3TM zone.

/// GRS80 semi-major axis in metres.
const GRS80_A: f64 = 6_378_137.0;
/// GRS80 flattening.
const GRS80_F: f64 = 1.0 / 298.257_222_101;

/// Newton iteration cap when recovering latitude from conformal latitude.
const MAX_LATITUDE_ITERATIONS: usize = 10;
const LATITUDE_CONVERGENCE: f64 = 1e-12;

/// Parameters of a transverse Mercator grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    /// Ellipsoid semi-major axis in metres.
    pub semi_major_axis: f64,
    /// Ellipsoid flattening.
    pub flattening: f64,
    /// Longitude of the central meridian in degrees.
    pub central_meridian: f64,
    /// Scale factor on the central meridian.
    pub scale_factor: f64,
    /// Easting of the central meridian in metres.
    pub false_easting: f64,
    /// Northing of the equator in metres.
    pub false_northing: f64,
}

/// Series coefficients derived from the ellipsoid.
struct Series {
    eccentricity: f64,
    /// Rectifying radius scaled by the grid scale factor.
    scaled_radius: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
}

impl TransverseMercator {
    /// NAD83 / Alberta 3TM ref merid 114 W (`EPSG:3776`).
    pub const ALBERTA_3TM_114: Self = Self {
        semi_major_axis: GRS80_A,
        flattening: GRS80_F,
        central_meridian: -114.0,
        scale_factor: 0.9999,
        false_easting: 0.0,
        false_northing: 0.0,
    };

    #[allow(clippy::suboptimal_flops)]
    fn series(&self) -> Series {
        let f = self.flattening;
        let n = f / (2.0 - f);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;
        let n6 = n5 * n;

        let rectifying_radius = self.semi_major_axis / (1.0 + n)
            * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0);

        let alpha = [
            n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3 + 41.0 / 180.0 * n4 - 127.0 / 288.0 * n5
                + 7891.0 / 37800.0 * n6,
            13.0 / 48.0 * n2 - 3.0 / 5.0 * n3 + 557.0 / 1440.0 * n4 + 281.0 / 630.0 * n5
                - 1_983_433.0 / 1_935_360.0 * n6,
            61.0 / 240.0 * n3 - 103.0 / 140.0 * n4 + 15061.0 / 26880.0 * n5
                + 167_603.0 / 181_440.0 * n6,
            49561.0 / 161_280.0 * n4 - 179.0 / 168.0 * n5 + 6_601_661.0 / 7_257_600.0 * n6,
            34729.0 / 80640.0 * n5 - 3_418_889.0 / 1_995_840.0 * n6,
            212_378_941.0 / 319_334_400.0 * n6,
        ];

        let beta = [
            n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3 - 1.0 / 360.0 * n4 - 81.0 / 512.0 * n5
                + 96199.0 / 604_800.0 * n6,
            1.0 / 48.0 * n2 + 1.0 / 15.0 * n3 - 437.0 / 1440.0 * n4 + 46.0 / 105.0 * n5
                - 1_118_711.0 / 3_870_720.0 * n6,
            17.0 / 480.0 * n3 - 37.0 / 840.0 * n4 - 209.0 / 4480.0 * n5 + 5569.0 / 90720.0 * n6,
            4397.0 / 161_280.0 * n4 - 11.0 / 504.0 * n5 - 830_251.0 / 7_257_600.0 * n6,
            4583.0 / 161_280.0 * n5 - 108_847.0 / 3_991_680.0 * n6,
            20_648_693.0 / 638_668_800.0 * n6,
        ];

        Series {
            eccentricity: (f * (2.0 - f)).sqrt(),
            scaled_radius: self.scale_factor * rectifying_radius,
            alpha,
            beta,
        }
    }

    /// Converts `(longitude, latitude)` degrees into `(easting, northing)`
    /// metres.
    #[must_use]
    pub fn forward(&self, longitude: f64, latitude: f64) -> (f64, f64) {
        let series = self.series();
        let e = series.eccentricity;

        let phi = latitude.to_radians();
        let lambda = (longitude - self.central_meridian).to_radians();

        let tau = phi.tan();
        let tau_conformal = conformal_tan(tau, e);

        let xi_prime = tau_conformal.atan2(lambda.cos());
        let eta_prime = (lambda.sin() / tau_conformal.hypot(lambda.cos())).asinh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (j, alpha) in series.alpha.iter().enumerate() {
            let k = harmonic(j);
            xi += alpha * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += alpha * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }

        (
            series.scaled_radius.mul_add(eta, self.false_easting),
            series.scaled_radius.mul_add(xi, self.false_northing),
        )
    }

    /// Converts `(easting, northing)` metres into `(longitude, latitude)`
    /// degrees.
    #[must_use]
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let series = self.series();
        let e = series.eccentricity;
        let one_minus_e2 = e.mul_add(-e, 1.0);

        let eta = (easting - self.false_easting) / series.scaled_radius;
        let xi = (northing - self.false_northing) / series.scaled_radius;

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, beta) in series.beta.iter().enumerate() {
            let k = harmonic(j);
            xi_prime -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= beta * (k * xi).cos() * (k * eta).sinh();
        }

        let sinh_eta = eta_prime.sinh();
        let (sin_xi, cos_xi) = xi_prime.sin_cos();
        let tau_conformal = sin_xi / sinh_eta.hypot(cos_xi);

        // Newton's method on tau, starting from the conformal value.
        let mut tau = tau_conformal;
        for _ in 0..MAX_LATITUDE_ITERATIONS {
            let tau_i = conformal_tan(tau, e);
            let delta = (tau_conformal - tau_i) / tau_i.hypot(1.0)
                * (one_minus_e2 * tau).mul_add(tau, 1.0)
                / (one_minus_e2 * tau.hypot(1.0));
            tau += delta;
            if delta.abs() < LATITUDE_CONVERGENCE {
                break;
            }
        }

        let latitude = tau.atan().to_degrees();
        let longitude = self.central_meridian + sinh_eta.atan2(cos_xi).to_degrees();
        (longitude, latitude)
    }
}

/// Tangent of the conformal latitude for a geodetic latitude tangent.
fn conformal_tan(tau: f64, e: f64) -> f64 {
    let sigma = (e * (e * tau / tau.hypot(1.0)).atanh()).sinh();
    tau * sigma.hypot(1.0) - sigma * tau.hypot(1.0)
}

/// `2 * (j + 1)` as a float, for the j-th series term.
#[allow(clippy::cast_precision_loss)]
fn harmonic(j: usize) -> f64 {
    2.0 * (j + 1) as f64
}
