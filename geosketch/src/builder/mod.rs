//! Shape construction strategies.
//!
//! Each shape family implements [`ShapeBuilder`] over its own session state: a
//! [`CaptureSequence`](crate::capture::CaptureSequence) for the clicked points, the
//! numeric parameters of the family, and the unit selections from its
//! [`SketchConfiguration`](crate::SketchConfiguration). Builders never talk to the
//! event bus or the renderer directly; the
//! [`SketchController`](crate::SketchController) routes events in and previews out.

use async_trait::async_trait;
use geosketch_types::GeodeticPoint;

use crate::capture::CaptureState;
use crate::error::SketchError;
use crate::feedback::Preview;
use crate::record::{ShapeKind, ShapeRecord};

mod circle;
mod ellipse;
mod line;
mod range_ring;

pub use circle::{CircleBuilder, RadiusMode};
pub use ellipse::{AxisMode, EllipseBuilder};
pub use line::{LineBuilder, LineFromMode};
pub use range_ring::{radial_azimuths, ring_radii, RangeRingBuilder, RingMode};

/// Result of feeding a captured point (or a double click) to a builder.
#[derive(Debug, Clone, PartialEq)]
pub enum PointOutcome {
    /// The point was captured. May carry an updated preview.
    Accepted(Option<Preview>),
    /// The point was ignored: surplus for this shape, or degenerate. Not an error.
    Ignored,
    /// The shape is now complete; the caller should commit it.
    Completed,
}

/// A capture strategy for one shape family.
#[async_trait(?Send)]
pub trait ShapeBuilder {
    /// The shape family this builder constructs.
    fn kind(&self) -> ShapeKind;

    /// Current state of the capture protocol.
    fn capture_state(&self) -> CaptureState;

    /// Whether the shape-specific minimum point/parameter set is satisfied.
    fn can_commit(&self) -> bool;

    /// Feeds a captured point to the builder.
    async fn add_point(&mut self, point: GeodeticPoint) -> Result<PointOutcome, SketchError>;

    /// Recomputes the interim preview for the current pointer position.
    ///
    /// Returns `None` when the builder has nothing to preview in its current state.
    async fn pointer_moved(&mut self, point: GeodeticPoint)
        -> Result<Option<Preview>, SketchError>;

    /// Handles a double click. Only meaningful for open-ended capture; the default
    /// implementation ignores it.
    async fn double_click(
        &mut self,
        _point: Option<GeodeticPoint>,
    ) -> Result<PointOutcome, SketchError> {
        Ok(PointOutcome::Ignored)
    }

    /// Synchronously discards all captured points and parameters.
    ///
    /// Must not wait for any in-flight geodesy computation.
    fn cancel(&mut self);

    /// Builds the finished shape records and resets the session.
    ///
    /// Most shapes produce exactly one record; interactive range rings produce one per
    /// drawn ring.
    async fn commit(&mut self) -> Result<Vec<ShapeRecord>, SketchError>;
}
