//! The geodesy primitive service boundary.
//!
//! The engine never does geodesic math itself. Everything it needs from an earth model
//! goes through the [`GeodesyService`] trait: inverse (distance and bearing between two
//! points), forward (point from origin, distance and bearing), and outline construction
//! for circles and ellipses. All values cross this boundary in canonical units, meters
//! and degrees.
//!
//! [`SphericalGeodesy`] is a reference implementation on a sphere, good enough for
//! previews and tests. Hosts with access to a proper ellipsoidal engine should provide
//! their own implementation instead.

use async_trait::async_trait;
use geosketch_types::{Contour, Datum, GeodeticPoint};
use serde::{Deserialize, Serialize};

use crate::error::SketchError;
use crate::units::bearing_from_tangent;

/// How the path between two points is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum LineConstructionMethod {
    /// Shortest path on the ellipsoid.
    #[default]
    Geodesic,
    /// Plane section through the ellipsoid center.
    GreatElliptic,
    /// Path of constant bearing (rhumb line).
    Loxodrome,
}

/// Result of an inverse geodesic computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseResult {
    /// Distance between the points in meters.
    pub distance_m: f64,
    /// Forward azimuth from the first point, degrees clockwise from north in `[0, 360)`.
    pub azimuth_deg: f64,
}

/// Geodesy primitive service consumed by the shape builders.
///
/// Implementations may cross a process or service boundary, so every operation is
/// async; builders await each call to completion before acting on its result.
#[async_trait(?Send)]
pub trait GeodesyService {
    /// Distance and forward azimuth between two points.
    async fn distance_and_bearing(
        &self,
        p1: GeodeticPoint,
        p2: GeodeticPoint,
        method: LineConstructionMethod,
    ) -> Result<InverseResult, SketchError>;

    /// The point at the given distance and azimuth from the origin.
    async fn point_from_distance_bearing(
        &self,
        origin: GeodeticPoint,
        distance_m: f64,
        azimuth_deg: f64,
        method: LineConstructionMethod,
    ) -> Result<GeodeticPoint, SketchError>;

    /// Closed outline of a circle with the given center and radius.
    async fn circle_geometry(
        &self,
        center: GeodeticPoint,
        radius_m: f64,
        method: LineConstructionMethod,
    ) -> Result<Contour<GeodeticPoint>, SketchError>;

    /// Closed outline of an ellipse given its semi-axes and the azimuth of the major
    /// axis.
    async fn ellipse_geometry(
        &self,
        center: GeodeticPoint,
        major_m: f64,
        minor_m: f64,
        azimuth_deg: f64,
        method: LineConstructionMethod,
    ) -> Result<Contour<GeodeticPoint>, SketchError>;
}

/// Reference implementation of [`GeodesyService`] on a sphere.
///
/// Uses the haversine inverse and the standard destination-point forward formula with
/// the mean radius of the configured datum. The construction method argument is
/// accepted but ignored; on a sphere the geodesic and great-elliptic paths coincide,
/// and rhumb-line support is left to host implementations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalGeodesy {
    datum: Datum,
    outline_vertex_count: usize,
}

impl SphericalGeodesy {
    /// Creates a new instance over the given datum.
    pub fn new(datum: Datum) -> Self {
        Self {
            datum,
            outline_vertex_count: 90,
        }
    }

    /// Sets the number of vertices used for circle and ellipse outlines.
    pub fn with_outline_vertex_count(mut self, count: usize) -> Self {
        self.outline_vertex_count = count;
        self
    }

    fn radius(&self) -> f64 {
        self.datum.mean_radius()
    }

    fn inverse(&self, p1: GeodeticPoint, p2: GeodeticPoint) -> InverseResult {
        let (lat1, lon1) = (p1.lat().to_radians(), p1.lon().to_radians());
        let (lat2, lon2) = (p2.lat().to_radians(), p2.lon().to_radians());
        let dlat = lat2 - lat1;
        let dlon = lon2 - lon1;

        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let distance_m = 2.0 * self.radius() * h.sqrt().asin();

        // East-based counterclockwise tangent angle, then normalized to a north-based
        // clockwise bearing.
        let east = lat2.cos() * dlon.sin();
        let north = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        let theta_deg = north.atan2(east).to_degrees().rem_euclid(360.0);
        let azimuth_deg = bearing_from_tangent(theta_deg).rem_euclid(360.0);

        InverseResult {
            distance_m,
            azimuth_deg,
        }
    }

    fn forward(&self, origin: GeodeticPoint, distance_m: f64, azimuth_deg: f64) -> GeodeticPoint {
        let lat1 = origin.lat().to_radians();
        let lon1 = origin.lon().to_radians();
        let bearing = azimuth_deg.to_radians();
        let angular = distance_m / self.radius();

        let lat2 =
            (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());

        GeodeticPoint::with_srid(
            lat2.to_degrees(),
            (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0,
            origin.srid(),
        )
    }
}

impl Default for SphericalGeodesy {
    fn default() -> Self {
        Self::new(Datum::WGS84)
    }
}

#[async_trait(?Send)]
impl GeodesyService for SphericalGeodesy {
    async fn distance_and_bearing(
        &self,
        p1: GeodeticPoint,
        p2: GeodeticPoint,
        _method: LineConstructionMethod,
    ) -> Result<InverseResult, SketchError> {
        Ok(self.inverse(p1, p2))
    }

    async fn point_from_distance_bearing(
        &self,
        origin: GeodeticPoint,
        distance_m: f64,
        azimuth_deg: f64,
        _method: LineConstructionMethod,
    ) -> Result<GeodeticPoint, SketchError> {
        if distance_m < 0.0 || !distance_m.is_finite() {
            return Err(SketchError::Geodesy(format!(
                "invalid forward distance: {distance_m}"
            )));
        }
        Ok(self.forward(origin, distance_m, azimuth_deg))
    }

    async fn circle_geometry(
        &self,
        center: GeodeticPoint,
        radius_m: f64,
        _method: LineConstructionMethod,
    ) -> Result<Contour<GeodeticPoint>, SketchError> {
        if radius_m <= 0.0 || !radius_m.is_finite() {
            return Err(SketchError::Geodesy(format!(
                "degenerate circle radius: {radius_m}"
            )));
        }

        let n = self.outline_vertex_count;
        let points = (0..n)
            .map(|i| self.forward(center, radius_m, i as f64 * 360.0 / n as f64))
            .collect();
        Ok(Contour::closed(points))
    }

    async fn ellipse_geometry(
        &self,
        center: GeodeticPoint,
        major_m: f64,
        minor_m: f64,
        azimuth_deg: f64,
        _method: LineConstructionMethod,
    ) -> Result<Contour<GeodeticPoint>, SketchError> {
        if major_m <= 0.0 || minor_m <= 0.0 || minor_m > major_m {
            return Err(SketchError::Geodesy(format!(
                "degenerate ellipse axes: major {major_m}, minor {minor_m}"
            )));
        }

        let n = self.outline_vertex_count;
        let points = (0..n)
            .map(|i| {
                let t = (i as f64 * 360.0 / n as f64).to_radians();
                // Polar radius of the ellipse at parameter t, measured from the
                // major axis.
                let r = major_m * minor_m
                    / ((minor_m * t.cos()).powi(2) + (major_m * t.sin()).powi(2)).sqrt();
                self.forward(center, r, azimuth_deg + t.to_degrees())
            })
            .collect();
        Ok(Contour::closed(points))
    }
}
