use serde::{Deserialize, Serialize};

/// Parameters of the reference ellipsoid used for geodetic calculations.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Datum {
    semimajor: f64,
    inv_flattening: f64,
}

impl Datum {
    /// Standard WGS84 ellipsoid.
    pub const WGS84: Self = Datum {
        semimajor: 6_378_137.0,
        inv_flattening: 298.257223563,
    };

    /// Semimajor axis in meters.
    pub fn semimajor(&self) -> f64 {
        self.semimajor
    }

    /// Inverse flattening of the ellipsoid.
    pub fn inv_flattening(&self) -> f64 {
        self.inv_flattening
    }

    /// Mean radius of the three ellipsoid semi-axes, in meters.
    ///
    /// Spherical approximations of geodesic operations use this radius.
    pub fn mean_radius(&self) -> f64 {
        let f = 1.0 / self.inv_flattening;
        let semiminor = self.semimajor * (1.0 - f);
        (2.0 * self.semimajor + semiminor) / 3.0
    }
}

impl Default for Datum {
    fn default() -> Self {
        Self::WGS84
    }
}
