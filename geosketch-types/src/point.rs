use serde::{Deserialize, Serialize};

/// Spatial reference id of the WGS84 geographic coordinate system.
pub const WGS84_SRID: u32 = 4326;

/// 2d point on the surface of a celestial body.
///
/// Coordinates are latitude/longitude in degrees, tagged with the spatial reference
/// system they were captured in. Points are immutable once constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct GeodeticPoint {
    lat: f64,
    lon: f64,
    srid: u32,
}

impl GeodeticPoint {
    /// Creates a new point in the WGS84 spatial reference.
    pub fn latlon(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            srid: WGS84_SRID,
        }
    }

    /// Creates a new point with an explicit spatial reference id.
    pub fn with_srid(lat: f64, lon: f64, srid: u32) -> Self {
        Self { lat, lon, srid }
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Spatial reference id of the coordinate values.
    pub fn srid(&self) -> u32 {
        self.srid
    }
}

/// Creates a new [`GeodeticPoint`] from latitude and longitude values (in degrees).
///
/// ```
/// use geosketch_types::latlon;
///
/// let point = latlon!(38.0, 52.0);
/// assert_eq!(point.lat(), 38.0);
/// ```
#[macro_export]
macro_rules! latlon {
    ($lat:expr, $lon:expr) => {
        $crate::GeodeticPoint::latlon($lat, $lon)
    };
}
