//! Finished shape records.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use geosketch_types::{Geom, GeodeticPoint};
use serde::{Deserialize, Serialize};

/// The shape families the engine can construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ShapeKind {
    /// A two-point or bearing-and-distance line.
    Line,
    /// A circle from a center and a radius.
    Circle,
    /// An ellipse from a center and two semi-axes.
    Ellipse,
    /// Concentric range rings with optional radials.
    RangeRing,
}

/// A typed attribute value of a shape record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AttributeValue {
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A floating point value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
}

/// Attribute field names shared by the shape builders.
pub mod fields {
    /// Distance in meters (line length, circle radius, ring spacing or radius).
    pub const DISTANCE: &str = "Distance";
    /// Display unit the distance was selected in at commit time.
    pub const DISTANCE_TYPE: &str = "DistanceType";
    /// Azimuth in degrees.
    pub const ANGLE: &str = "Angle";
    /// Major semi-axis in meters.
    pub const MAJOR_AXIS: &str = "MajorAxis";
    /// Minor semi-axis in meters.
    pub const MINOR_AXIS: &str = "MinorAxis";
    /// Number of rings.
    pub const RINGS: &str = "Rings";
    /// Number of radials.
    pub const RADIALS: &str = "Radials";
    /// One-based index of a ring within an interactive range ring set.
    pub const RING: &str = "Ring";
}

/// A finished, immutable shape produced by a commit.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ShapeRecord {
    id: u64,
    kind: ShapeKind,
    geometry: Geom<GeodeticPoint>,
    attributes: HashMap<String, AttributeValue>,
    is_temporary: bool,
}

impl ShapeRecord {
    /// Creates a new committed record.
    pub fn new(
        id: u64,
        kind: ShapeKind,
        geometry: Geom<GeodeticPoint>,
        attributes: HashMap<String, AttributeValue>,
    ) -> Self {
        Self {
            id,
            kind,
            geometry,
            attributes,
            is_temporary: false,
        }
    }

    /// Marks the record as temporary (preview) geometry.
    pub fn temporary(mut self) -> Self {
        self.is_temporary = true;
        self
    }

    /// Unique row id of the record.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Shape family of the record.
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Geometry of the shape, in the units of its captured points.
    pub fn geometry(&self) -> &Geom<GeodeticPoint> {
        &self.geometry
    }

    /// Typed attributes of the shape. The field set depends on [`ShapeRecord::kind`].
    pub fn attributes(&self) -> &HashMap<String, AttributeValue> {
        &self.attributes
    }

    /// Looks up a single attribute by field name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Whether the record holds preview rather than committed geometry.
    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }
}

/// Source of unique row ids for shape records.
///
/// An instance is injected into every builder; clones share the same counter, so all
/// records committed through one controller get distinct ids.
#[derive(Debug, Clone, Default)]
pub struct RowIdSource {
    next: Rc<Cell<u64>>,
}

impl RowIdSource {
    /// Creates a new source starting from id 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unique id.
    pub fn next_id(&self) -> u64 {
        let id = self.next.get() + 1;
        self.next.set(id);
        id
    }
}
