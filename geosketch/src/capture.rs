//! The multi-point capture protocol shared by all shape families.
//!
//! Every builder owns a [`CaptureSequence`] configured by a small [`CapturePolicy`]:
//! how many points the shape needs and whether it keeps accepting points once ready
//! (range rings in interactive mode do). The sequence tracks the captured points and
//! derives the current [`CaptureState`] from them, so the state can never disagree
//! with the data.

use geosketch_types::GeodeticPoint;

/// State of a shape capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No points captured yet.
    AwaitingPoint1,
    /// One point captured, waiting for the second.
    AwaitingPoint2,
    /// Two points captured, waiting for the third (ellipse only).
    AwaitingPoint3,
    /// The minimum point set is satisfied; the shape can be committed.
    ///
    /// Open-ended sequences keep accepting points in this state. A commit emits one
    /// shape record and resets the sequence back to [`CaptureState::AwaitingPoint1`].
    Ready,
}

/// Per-shape-family parameters of the capture protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturePolicy {
    point_budget: usize,
    open_ended: bool,
}

impl CapturePolicy {
    /// A shape captured from a single point (range ring center).
    pub fn single_point() -> Self {
        Self {
            point_budget: 1,
            open_ended: false,
        }
    }

    /// A shape captured from two points (line, circle).
    pub fn two_point() -> Self {
        Self {
            point_budget: 2,
            open_ended: false,
        }
    }

    /// A shape captured from three points (ellipse).
    pub fn three_point() -> Self {
        Self {
            point_budget: 3,
            open_ended: false,
        }
    }

    /// A shape that keeps accepting points after the budget is met (interactive range
    /// rings).
    pub fn open_ended(mut self) -> Self {
        self.open_ended = true;
        self
    }

    /// Minimum number of points the shape needs.
    pub fn point_budget(&self) -> usize {
        self.point_budget
    }
}

/// Ordered list of captured points plus the capture state derived from it.
#[derive(Debug, Clone)]
pub struct CaptureSequence {
    points: Vec<GeodeticPoint>,
    policy: CapturePolicy,
}

impl CaptureSequence {
    /// Creates an empty sequence with the given policy.
    pub fn new(policy: CapturePolicy) -> Self {
        Self {
            points: Vec::new(),
            policy,
        }
    }

    /// Current state of the capture.
    pub fn state(&self) -> CaptureState {
        match (self.points.len(), self.policy.point_budget) {
            (n, budget) if n >= budget => CaptureState::Ready,
            (0, _) => CaptureState::AwaitingPoint1,
            (1, _) => CaptureState::AwaitingPoint2,
            _ => CaptureState::AwaitingPoint3,
        }
    }

    /// Whether the minimum point set is satisfied.
    pub fn is_ready(&self) -> bool {
        self.state() == CaptureState::Ready
    }

    /// Adds a captured point.
    ///
    /// Returns `false` if the sequence is already saturated and not open-ended; the
    /// surplus point is ignored, which is not an error.
    pub fn push(&mut self, point: GeodeticPoint) -> bool {
        if self.is_ready() && !self.policy.open_ended {
            log::debug!("ignoring surplus capture point: sequence is complete");
            return false;
        }

        self.points.push(point);
        true
    }

    /// Captured points, in capture order.
    pub fn points(&self) -> &[GeodeticPoint] {
        &self.points
    }

    /// The first captured point, if any.
    pub fn first(&self) -> Option<GeodeticPoint> {
        self.points.first().copied()
    }

    /// Number of captured points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no points have been captured.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Discards all captured points and returns to [`CaptureState::AwaitingPoint1`].
    pub fn reset(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use geosketch_types::latlon;

    use super::*;

    #[test]
    fn two_point_transitions() {
        let mut sequence = CaptureSequence::new(CapturePolicy::two_point());
        assert_eq!(sequence.state(), CaptureState::AwaitingPoint1);

        assert!(sequence.push(latlon!(1.0, 1.0)));
        assert_eq!(sequence.state(), CaptureState::AwaitingPoint2);

        assert!(sequence.push(latlon!(2.0, 2.0)));
        assert_eq!(sequence.state(), CaptureState::Ready);
    }

    #[test]
    fn three_point_transitions() {
        let mut sequence = CaptureSequence::new(CapturePolicy::three_point());
        sequence.push(latlon!(1.0, 1.0));
        sequence.push(latlon!(2.0, 2.0));
        assert_eq!(sequence.state(), CaptureState::AwaitingPoint3);

        sequence.push(latlon!(3.0, 3.0));
        assert_eq!(sequence.state(), CaptureState::Ready);
    }

    #[test]
    fn surplus_points_are_ignored() {
        let mut sequence = CaptureSequence::new(CapturePolicy::two_point());
        sequence.push(latlon!(1.0, 1.0));
        sequence.push(latlon!(2.0, 2.0));

        assert!(!sequence.push(latlon!(3.0, 3.0)));
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.state(), CaptureState::Ready);
    }

    #[test]
    fn open_ended_keeps_accepting() {
        let mut sequence = CaptureSequence::new(CapturePolicy::single_point().open_ended());
        sequence.push(latlon!(1.0, 1.0));
        assert_eq!(sequence.state(), CaptureState::Ready);

        assert!(sequence.push(latlon!(2.0, 2.0)));
        assert!(sequence.push(latlon!(3.0, 3.0)));
        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence.state(), CaptureState::Ready);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut sequence = CaptureSequence::new(CapturePolicy::two_point());
        sequence.push(latlon!(1.0, 1.0));
        sequence.reset();

        assert!(sequence.is_empty());
        assert_eq!(sequence.state(), CaptureState::AwaitingPoint1);
    }
}
