//! Throttling and supersession of preview computations.
//!
//! Pointer moves can arrive far faster than the geodesy service should be called.
//! [`FeedbackController`] bounds the call rate to a fixed interval, and hands out
//! [`PreviewToken`]s so that a preview computed for an older pointer position is
//! discarded when a newer one has started in the meantime. Clicks and double clicks
//! bypass the throttle entirely.

use std::time::Duration;

use geosketch_types::{Geom, GeodeticPoint};
use web_time::SystemTime;

use crate::units::{AngularUnit, DistanceUnit};

/// Numeric feedback shown next to the pointer while constructing a shape.
///
/// Which fields are populated depends on the active shape family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readout {
    /// Distance in the session's selected distance unit.
    pub distance: Option<f64>,
    /// Unit of [`Readout::distance`].
    pub distance_unit: Option<DistanceUnit>,
    /// Azimuth in the session's selected angular unit.
    pub azimuth: Option<f64>,
    /// Unit of [`Readout::azimuth`].
    pub azimuth_unit: Option<AngularUnit>,
    /// Ring count (range rings).
    pub rings: Option<u32>,
    /// Radial count (range rings).
    pub radials: Option<u32>,
}

/// An interim result of a shape under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    /// Geometry to display as temporary.
    pub geometry: Geom<GeodeticPoint>,
    /// Numeric feedback for the UI.
    pub readout: Readout,
}

/// Token identifying one preview computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewToken(u64);

/// Throttle and supersession state for pointer-move driven previews.
#[derive(Debug)]
pub struct FeedbackController {
    interval: Duration,
    last_update: Option<SystemTime>,
    generation: u64,
}

impl FeedbackController {
    /// Creates a new controller with the given throttle interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_update: None,
            generation: 0,
        }
    }

    /// Whether a pointer-move recomputation is allowed right now.
    ///
    /// Returns `false` while inside the throttle window. When it returns `true` the
    /// window restarts.
    pub fn should_update(&mut self) -> bool {
        let now = SystemTime::now();
        if let Some(last) = self.last_update {
            if now.duration_since(last).unwrap_or_default() < self.interval {
                return false;
            }
        }

        self.last_update = Some(now);
        true
    }

    /// Starts a new preview computation, superseding any pending one.
    pub fn begin(&mut self) -> PreviewToken {
        self.generation += 1;
        PreviewToken(self.generation)
    }

    /// Whether the computation identified by the token is still the latest one.
    ///
    /// Stale results must be discarded, never queued.
    pub fn is_current(&self, token: PreviewToken) -> bool {
        token.0 == self.generation
    }

    /// Invalidates all pending computations without starting a new one.
    ///
    /// Called on cancel, tab switch and commit. Does not wait for anything in flight;
    /// whatever completes later simply fails the [`FeedbackController::is_current`]
    /// check.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.last_update = None;
    }
}
