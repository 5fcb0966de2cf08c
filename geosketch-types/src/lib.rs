//! Geodetic point and geometry types used by the `geosketch` construction engine.
//!
//! These types carry no construction logic of their own. They are the currency that
//! crosses the engine's external boundaries: captured points come in as
//! [`GeodeticPoint`]s, and preview/committed geometries go out as [`Geom`] values
//! built from [`Contour`]s and [`Polygon`]s.

mod contour;
mod datum;
mod geometry;
mod point;
mod polygon;

pub use contour::{ClosedContour, Contour};
pub use datum::Datum;
pub use geometry::Geom;
pub use point::{GeodeticPoint, WGS84_SRID};
pub use polygon::Polygon;
