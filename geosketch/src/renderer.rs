//! The renderer boundary.

use geosketch_types::{Geom, GeodeticPoint};

use crate::record::ShapeRecord;

/// Sink for preview and committed geometry.
///
/// The engine never draws anything itself; it tells the host's renderer what to show.
/// Implementations that need mutable state should use interior mutability, as all
/// calls happen on the single engine thread.
pub trait SketchRenderer {
    /// Shows or replaces the in-progress preview geometry.
    fn show_preview(&self, geometry: &Geom<GeodeticPoint>, is_temporary: bool);

    /// Drops any temporary geometry currently shown.
    fn clear_preview(&self);

    /// Displays a committed shape.
    fn commit_shape(&self, record: &ShapeRecord);
}

/// A renderer that ignores everything. Useful for tests and headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyRenderer;

impl SketchRenderer for DummyRenderer {
    fn show_preview(&self, _geometry: &Geom<GeodeticPoint>, _is_temporary: bool) {}
    fn clear_preview(&self) {}
    fn commit_shape(&self, _record: &ShapeRecord) {}
}
