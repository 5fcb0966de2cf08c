use serde::{Deserialize, Serialize};

use crate::contour::Contour;
use crate::polygon::Polygon;

/// Geometry of a sketched shape.
///
/// This is the unit-agnostic value handed to renderers and exporters. Which variant a
/// shape produces depends on its family: lines and radials are contours, circle and
/// ellipse outlines are closed contours or polygons, a lone captured center is a point.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum Geom<P> {
    /// A single point.
    Point(P),
    /// A single polyline or ring.
    Contour(Contour<P>),
    /// Several contours treated as one geometry (e.g. range rings with radials).
    MultiContour(Vec<Contour<P>>),
    /// A polygon.
    Polygon(Polygon<P>),
}

impl<P> Geom<P> {
    /// Total number of points in the geometry.
    pub fn point_count(&self) -> usize {
        match self {
            Geom::Point(_) => 1,
            Geom::Contour(c) => c.len(),
            Geom::MultiContour(cs) => cs.iter().map(|c| c.len()).sum(),
            Geom::Polygon(p) => {
                p.outer_contour.points.len()
                    + p.inner_contours.iter().map(|c| c.points.len()).sum::<usize>()
            }
        }
    }
}

impl<P> From<Contour<P>> for Geom<P> {
    fn from(value: Contour<P>) -> Self {
        Geom::Contour(value)
    }
}

impl<P> From<Polygon<P>> for Geom<P> {
    fn from(value: Polygon<P>) -> Self {
        Geom::Polygon(value)
    }
}
