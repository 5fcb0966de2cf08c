//! Engine configuration.

use std::time::Duration;

use crate::geodesy::LineConstructionMethod;
use crate::units::{AngularUnit, DistanceUnit};

const DEFAULT_FEEDBACK_INTERVAL: Duration = Duration::from_millis(150);

/// Configuration of a sketch session.
///
/// An explicit value of this type is passed into every builder at construction; there
/// is no shared global configuration. Each session owns its copy, so unit changes in
/// one tab never leak into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SketchConfiguration {
    distance_unit: DistanceUnit,
    azimuth_unit: AngularUnit,
    method: LineConstructionMethod,
    feedback_interval: Duration,
}

impl Default for SketchConfiguration {
    fn default() -> Self {
        Self {
            distance_unit: DistanceUnit::Meters,
            azimuth_unit: AngularUnit::Degrees,
            method: LineConstructionMethod::Geodesic,
            feedback_interval: DEFAULT_FEEDBACK_INTERVAL,
        }
    }
}

impl SketchConfiguration {
    /// Distance unit used for numeric display and readouts.
    pub fn distance_unit(&self) -> DistanceUnit {
        self.distance_unit
    }

    /// Sets the distance unit used for numeric display and readouts.
    pub fn with_distance_unit(mut self, unit: DistanceUnit) -> Self {
        self.distance_unit = unit;
        self
    }

    /// Sets the distance unit used for numeric display and readouts.
    pub fn set_distance_unit(&mut self, unit: DistanceUnit) {
        self.distance_unit = unit;
    }

    /// Angular unit used for azimuth display and readouts.
    pub fn azimuth_unit(&self) -> AngularUnit {
        self.azimuth_unit
    }

    /// Sets the angular unit used for azimuth display and readouts.
    pub fn with_azimuth_unit(mut self, unit: AngularUnit) -> Self {
        self.azimuth_unit = unit;
        self
    }

    /// Sets the angular unit used for azimuth display and readouts.
    pub fn set_azimuth_unit(&mut self, unit: AngularUnit) {
        self.azimuth_unit = unit;
    }

    /// Line construction method passed to the geodesy service.
    pub fn method(&self) -> LineConstructionMethod {
        self.method
    }

    /// Sets the line construction method passed to the geodesy service.
    pub fn with_method(mut self, method: LineConstructionMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the line construction method passed to the geodesy service.
    pub fn set_method(&mut self, method: LineConstructionMethod) {
        self.method = method;
    }

    /// Minimum interval between pointer-move preview recomputations.
    ///
    /// Clicks and double clicks are never throttled.
    pub fn feedback_interval(&self) -> Duration {
        self.feedback_interval
    }

    /// Sets the minimum interval between pointer-move preview recomputations.
    pub fn with_feedback_interval(mut self, interval: Duration) -> Self {
        self.feedback_interval = interval;
        self
    }

    /// Sets the minimum interval between pointer-move preview recomputations.
    pub fn set_feedback_interval(&mut self, interval: Duration) {
        self.feedback_interval = interval;
    }
}
