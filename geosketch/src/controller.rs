//! The host-independent coordinator.
//!
//! [`SketchController`] owns one builder per shape family and routes bus events to
//! whichever one belongs to the active tab. Host adapters translate their native
//! pointer events into [`SketchEvent`]s, publish them on an
//! [`EventBus`](crate::EventBus), and drain committed records for export.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use geosketch_types::GeodeticPoint;

use crate::builder::{
    CircleBuilder, EllipseBuilder, LineBuilder, PointOutcome, RangeRingBuilder, ShapeBuilder,
};
use crate::capture::CaptureState;
use crate::config::SketchConfiguration;
use crate::error::SketchError;
use crate::event::{EventBus, EventPropagation, HandlerId, SketchEvent, SketchEventHandler, Topic};
use crate::feedback::{FeedbackController, Readout};
use crate::geodesy::GeodesyService;
use crate::record::{RowIdSource, ShapeKind, ShapeRecord};
use crate::renderer::SketchRenderer;

/// Routes capture events to the active shape builder and previews/records out.
pub struct SketchController {
    renderer: Rc<dyn SketchRenderer>,
    feedback: FeedbackController,
    line: LineBuilder,
    circle: CircleBuilder,
    ellipse: EllipseBuilder,
    range_ring: RangeRingBuilder,
    active: Option<ShapeKind>,
    committed: Vec<ShapeRecord>,
    last_readout: Option<Readout>,
    last_error: Option<SketchError>,
}

impl SketchController {
    /// Creates a controller with one independent session per shape family.
    pub fn new(
        geodesy: Rc<dyn GeodesyService>,
        renderer: Rc<dyn SketchRenderer>,
        config: SketchConfiguration,
    ) -> Self {
        let ids = RowIdSource::new();
        Self {
            renderer,
            feedback: FeedbackController::new(config.feedback_interval()),
            line: LineBuilder::new(geodesy.clone(), ids.clone(), config),
            circle: CircleBuilder::new(geodesy.clone(), ids.clone(), config),
            ellipse: EllipseBuilder::new(geodesy.clone(), ids.clone(), config),
            range_ring: RangeRingBuilder::new(geodesy, ids, config),
            active: None,
            committed: Vec::new(),
            last_readout: None,
            last_error: None,
        }
    }

    /// Subscribes a shared controller to all engine topics on the given bus.
    pub fn subscribe(controller: Rc<RefCell<Self>>, bus: &mut dyn EventBus) -> HandlerId {
        bus.subscribe(&Topic::ALL, Box::new(controller))
    }

    /// The currently active shape tab, if any.
    pub fn active_kind(&self) -> Option<ShapeKind> {
        self.active
    }

    /// Capture state of the active builder.
    pub fn capture_state(&self) -> Option<CaptureState> {
        Some(self.builder(self.active?).capture_state())
    }

    /// The latest numeric readout, for UI display.
    pub fn readout(&self) -> Option<&Readout> {
        self.last_readout.as_ref()
    }

    /// The last error surfaced from event handling, if any. Clears it.
    pub fn take_last_error(&mut self) -> Option<SketchError> {
        self.last_error.take()
    }

    /// Direct access to the line session for numeric input.
    pub fn line_mut(&mut self) -> &mut LineBuilder {
        &mut self.line
    }

    /// Direct access to the circle session for numeric input.
    pub fn circle_mut(&mut self) -> &mut CircleBuilder {
        &mut self.circle
    }

    /// Direct access to the ellipse session for numeric input.
    pub fn ellipse_mut(&mut self) -> &mut EllipseBuilder {
        &mut self.ellipse
    }

    /// Direct access to the range ring session for numeric input.
    pub fn range_ring_mut(&mut self) -> &mut RangeRingBuilder {
        &mut self.range_ring
    }

    /// Removes and returns all records committed so far, oldest first.
    pub fn take_committed(&mut self) -> Vec<ShapeRecord> {
        std::mem::take(&mut self.committed)
    }

    fn builder(&self, kind: ShapeKind) -> &dyn ShapeBuilder {
        match kind {
            ShapeKind::Line => &self.line,
            ShapeKind::Circle => &self.circle,
            ShapeKind::Ellipse => &self.ellipse,
            ShapeKind::RangeRing => &self.range_ring,
        }
    }

    fn builder_mut(&mut self, kind: ShapeKind) -> &mut dyn ShapeBuilder {
        match kind {
            ShapeKind::Line => &mut self.line,
            ShapeKind::Circle => &mut self.circle,
            ShapeKind::Ellipse => &mut self.ellipse,
            ShapeKind::RangeRing => &mut self.range_ring,
        }
    }

    /// Activates a shape tab, cancelling whatever the previous tab was doing.
    pub fn select_tab(&mut self, tab: Option<ShapeKind>) {
        if self.active == tab {
            return;
        }
        self.cancel_active();
        self.active = tab;
    }

    /// Cancels the active capture: clears points, previews and pending computations.
    ///
    /// Synchronous: does not wait for in-flight geodesy calls, whose results will be
    /// discarded by the feedback generation check.
    pub fn cancel_active(&mut self) {
        if let Some(kind) = self.active {
            self.builder_mut(kind).cancel();
        }
        self.feedback.invalidate();
        self.last_readout = None;
        self.renderer.clear_preview();
    }

    /// Commits the active shape and hands the records to the renderer and the export
    /// queue.
    pub async fn commit_active(&mut self) -> Result<(), SketchError> {
        let kind = self
            .active
            .ok_or(SketchError::IncompleteShape("no active shape tab"))?;

        let records = self.builder_mut(kind).commit().await?;
        log::debug!("committed {} {kind:?} record(s)", records.len());
        for record in &records {
            self.renderer.commit_shape(record);
        }
        self.committed.extend(records);

        self.feedback.invalidate();
        self.last_readout = None;
        self.renderer.clear_preview();
        Ok(())
    }

    /// Handles one bus event. Validation and geodesy errors are returned to the
    /// caller; they never corrupt the session.
    pub async fn handle_event(
        &mut self,
        event: &SketchEvent,
    ) -> Result<EventPropagation, SketchError> {
        match event.topic {
            Topic::TabSelected => {
                self.select_tab(event.tab);
                Ok(EventPropagation::Propagate)
            }
            Topic::KeyEscape => {
                self.cancel_active();
                Ok(EventPropagation::Propagate)
            }
            Topic::NewPoint => {
                let Some(point) = event.point else {
                    return Ok(EventPropagation::Propagate);
                };
                self.accept_point(point).await?;
                Ok(EventPropagation::Stop)
            }
            Topic::PointerMove => {
                let Some(point) = event.point else {
                    return Ok(EventPropagation::Propagate);
                };
                self.pointer_moved(point).await?;
                Ok(EventPropagation::Propagate)
            }
            Topic::DoubleClick => {
                let Some(kind) = self.active else {
                    return Ok(EventPropagation::Propagate);
                };
                let outcome = self.builder_mut(kind).double_click(event.point).await?;
                if outcome == PointOutcome::Completed {
                    self.commit_active().await?;
                }
                Ok(EventPropagation::Stop)
            }
        }
    }

    async fn accept_point(&mut self, point: GeodeticPoint) -> Result<(), SketchError> {
        let Some(kind) = self.active else {
            return Ok(());
        };

        match self.builder_mut(kind).add_point(point).await? {
            PointOutcome::Completed => self.commit_active().await?,
            PointOutcome::Accepted(Some(preview)) => {
                self.renderer.show_preview(&preview.geometry, true);
                self.last_readout = Some(preview.readout);
            }
            PointOutcome::Accepted(None) | PointOutcome::Ignored => {}
        }
        Ok(())
    }

    async fn pointer_moved(&mut self, point: GeodeticPoint) -> Result<(), SketchError> {
        let Some(kind) = self.active else {
            return Ok(());
        };
        if !self.feedback.should_update() {
            return Ok(());
        }

        let token = self.feedback.begin();
        let preview = self.builder_mut(kind).pointer_moved(point).await?;

        // A cancel or a newer pointer position may have superseded this computation
        // while the geodesy call was in flight.
        if !self.feedback.is_current(token) {
            log::trace!("discarding stale preview");
            return Ok(());
        }
        if let Some(preview) = preview {
            log::trace!(
                "showing preview with {} vertices",
                preview.geometry.point_count()
            );
            self.renderer.show_preview(&preview.geometry, true);
            self.last_readout = Some(preview.readout);
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl SketchEventHandler for Rc<RefCell<SketchController>> {
    async fn handle(&mut self, event: &SketchEvent) -> EventPropagation {
        let mut controller = self.borrow_mut();
        match controller.handle_event(event).await {
            Ok(propagation) => propagation,
            Err(error) => {
                log::warn!("sketch event handling failed: {error}");
                controller.last_error = Some(error);
                EventPropagation::Propagate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use approx::assert_relative_eq;
    use assert_matches::assert_matches;
    use geosketch_types::{latlon, Geom, GeodeticPoint};
    use tokio_test::block_on;

    use super::*;
    use crate::builder::{LineFromMode, RingMode};
    use crate::event::InProcessBus;
    use crate::geodesy::SphericalGeodesy;
    use crate::record::{fields, AttributeValue};
    use crate::units::{DistanceUnit, RateUnit, TimeUnit};

    /// Records what the engine asked the renderer to do.
    #[derive(Default)]
    struct RecordingRenderer {
        previews: RefCell<u32>,
        clears: RefCell<u32>,
        committed: RefCell<u32>,
    }

    impl SketchRenderer for RecordingRenderer {
        fn show_preview(&self, _geometry: &Geom<GeodeticPoint>, is_temporary: bool) {
            assert!(is_temporary);
            *self.previews.borrow_mut() += 1;
        }

        fn clear_preview(&self) {
            *self.clears.borrow_mut() += 1;
        }

        fn commit_shape(&self, _record: &ShapeRecord) {
            *self.committed.borrow_mut() += 1;
        }
    }

    fn controller_with(renderer: Rc<RecordingRenderer>) -> SketchController {
        SketchController::new(
            Rc::new(SphericalGeodesy::default()),
            renderer,
            SketchConfiguration::default().with_feedback_interval(Duration::ZERO),
        )
    }

    fn controller() -> SketchController {
        controller_with(Rc::new(RecordingRenderer::default()))
    }

    #[test]
    fn escape_after_first_point_resets_session() {
        let mut controller = controller();
        controller.select_tab(Some(ShapeKind::Line));

        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(10.0, 20.0))))
            .expect("point accepted");
        assert_eq!(controller.capture_state(), Some(CaptureState::AwaitingPoint2));

        block_on(controller.handle_event(&SketchEvent::key_escape())).expect("escape handled");
        assert_eq!(controller.capture_state(), Some(CaptureState::AwaitingPoint1));
        assert!(controller.take_committed().is_empty());
    }

    #[test]
    fn two_clicks_commit_a_line() {
        let renderer = Rc::new(RecordingRenderer::default());
        let mut controller = controller_with(renderer.clone());
        controller.select_tab(Some(ShapeKind::Line));

        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(0.0, 0.0))))
            .expect("first point");
        block_on(controller.handle_event(&SketchEvent::pointer_move(latlon!(0.0, 0.5))))
            .expect("pointer move");
        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(0.0, 1.0))))
            .expect("second point");

        let committed = controller.take_committed();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].kind(), ShapeKind::Line);
        assert!(*renderer.previews.borrow() > 0);
        assert_eq!(*renderer.committed.borrow(), 1);
        // The session reset for the next line.
        assert_eq!(controller.capture_state(), Some(CaptureState::AwaitingPoint1));
    }

    #[test]
    fn travel_time_circle_end_to_end() {
        let mut controller = controller();
        controller.select_tab(Some(ShapeKind::Circle));

        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(34.4, -119.8))))
            .expect("center captured");

        let circle = controller.circle_mut();
        circle.config_mut().set_distance_unit(DistanceUnit::Kilometers);
        circle
            .set_rate_unit(RateUnit::new(DistanceUnit::Kilometers, TimeUnit::Hours))
            .expect("rate unit");
        circle.set_travel_rate(50.0).expect("rate");
        circle.set_travel_time(2.0).expect("time");
        assert_relative_eq!(circle.radius().expect("radius").meters(), 100_000.0);

        block_on(controller.commit_active()).expect("circle commits");

        let committed = controller.take_committed();
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].kind(), ShapeKind::Circle);
        assert_matches!(
            committed[0].attribute(fields::DISTANCE),
            Some(AttributeValue::Float(d)) if (d - 100_000.0).abs() < 1e-6
        );
        assert_matches!(
            committed[0].attribute(fields::DISTANCE_TYPE),
            Some(AttributeValue::String(s)) if s == "Kilometers"
        );
    }

    #[test]
    fn tab_switch_cancels_in_progress_capture() {
        let renderer = Rc::new(RecordingRenderer::default());
        let mut controller = controller_with(renderer.clone());
        controller.select_tab(Some(ShapeKind::Ellipse));

        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(0.0, 0.0))))
            .expect("center");
        block_on(controller.handle_event(&SketchEvent::tab_selected(Some(ShapeKind::Circle))))
            .expect("tab switched");

        assert_eq!(controller.active_kind(), Some(ShapeKind::Circle));
        assert_eq!(controller.capture_state(), Some(CaptureState::AwaitingPoint1));
        // The ellipse session was destroyed, not parked.
        controller.select_tab(Some(ShapeKind::Ellipse));
        assert_eq!(controller.capture_state(), Some(CaptureState::AwaitingPoint1));
        assert!(*renderer.clears.borrow() > 0);
    }

    #[test]
    fn interactive_rings_commit_on_double_click() {
        let mut controller = controller();
        controller.select_tab(Some(ShapeKind::RangeRing));
        controller.range_ring_mut().set_mode(RingMode::Interactive);

        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(45.0, 10.0))))
            .expect("center");
        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(45.0, 10.05))))
            .expect("first ring");
        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(45.0, 10.1))))
            .expect("second ring");
        block_on(controller.handle_event(&SketchEvent::double_click(None)))
            .expect("capture ended");

        let committed = controller.take_committed();
        assert_eq!(committed.len(), 2);
        assert!(committed.iter().all(|r| r.kind() == ShapeKind::RangeRing));
    }

    #[test]
    fn pointer_moves_within_throttle_window_are_dropped() {
        let renderer = Rc::new(RecordingRenderer::default());
        let mut controller = SketchController::new(
            Rc::new(SphericalGeodesy::default()),
            renderer.clone(),
            SketchConfiguration::default().with_feedback_interval(Duration::from_secs(3600)),
        );
        controller.select_tab(Some(ShapeKind::Line));

        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(0.0, 0.0))))
            .expect("first point");
        block_on(controller.handle_event(&SketchEvent::pointer_move(latlon!(0.0, 0.5))))
            .expect("first move");
        block_on(controller.handle_event(&SketchEvent::pointer_move(latlon!(0.0, 0.6))))
            .expect("throttled move");

        assert_eq!(*renderer.previews.borrow(), 1);
    }

    #[test]
    fn records_get_unique_ids_across_builders() {
        let mut controller = controller();

        controller.select_tab(Some(ShapeKind::Line));
        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(0.0, 0.0))))
            .expect("line p1");
        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(0.0, 1.0))))
            .expect("line p2");

        controller.select_tab(Some(ShapeKind::Circle));
        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(0.0, 0.0))))
            .expect("center");
        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(0.0, 1.0))))
            .expect("radius point");

        let committed = controller.take_committed();
        assert_eq!(committed.len(), 2);
        assert_ne!(committed[0].id(), committed[1].id());
    }

    #[test]
    fn validation_error_is_surfaced_through_the_bus() {
        let controller = Rc::new(RefCell::new(controller()));
        controller
            .borrow_mut()
            .select_tab(Some(ShapeKind::Line));
        controller
            .borrow_mut()
            .line_mut()
            .set_mode(LineFromMode::BearingAndDistance);

        let mut bus = InProcessBus::new();
        SketchController::subscribe(controller.clone(), &mut bus);

        // A double click in a state that cannot commit is ignored; force an error by
        // committing a line with no azimuth through the bus-facing API instead.
        block_on(bus.publish(SketchEvent::new_point(latlon!(0.0, 0.0))));
        let error = block_on(controller.borrow_mut().commit_active());
        assert_matches!(error, Err(SketchError::MissingAzimuth));
    }

    #[test]
    fn events_without_active_tab_are_ignored() {
        let mut controller = controller();
        block_on(controller.handle_event(&SketchEvent::new_point(latlon!(0.0, 0.0))))
            .expect("no-op");
        block_on(controller.handle_event(&SketchEvent::double_click(None))).expect("no-op");
        assert!(controller.take_committed().is_empty());
        assert_eq!(controller.capture_state(), None);
    }
}
