use serde::{Deserialize, Serialize};

/// An ordered sequence of points, either open (a polyline) or closed (a ring).
#[derive(Debug, Default, Clone, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct Contour<Point> {
    points: Vec<Point>,
    is_closed: bool,
}

impl<Point> std::ops::Deref for Contour<Point> {
    type Target = Vec<Point>;

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl<Point> Contour<Point> {
    /// Creates a new contour.
    pub fn new(points: Vec<Point>, is_closed: bool) -> Self {
        Self { points, is_closed }
    }

    /// Creates a new open contour.
    pub fn open(points: Vec<Point>) -> Self {
        Self {
            points,
            is_closed: false,
        }
    }

    /// Creates a new closed contour.
    pub fn closed(points: Vec<Point>) -> Self {
        Self {
            points,
            is_closed: true,
        }
    }

    /// Whether the last point is considered connected to the first one.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// Converts self into a `ClosedContour` instance if the contour is closed, or
    /// returns `None` if the contour is open.
    pub fn into_closed(self) -> Option<ClosedContour<Point>> {
        if self.is_closed {
            Some(ClosedContour {
                points: self.points,
            })
        } else {
            None
        }
    }
}

/// A contour that is guaranteed to be closed.
#[derive(Debug, Default, Clone, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct ClosedContour<Point> {
    /// Points of the contour. The edge between the last and the first points is implied.
    pub points: Vec<Point>,
}

impl<Point> ClosedContour<Point> {
    /// Creates a new closed contour.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }
}

impl<Point> From<ClosedContour<Point>> for Contour<Point> {
    fn from(value: ClosedContour<Point>) -> Self {
        Self {
            points: value.points,
            is_closed: true,
        }
    }
}
