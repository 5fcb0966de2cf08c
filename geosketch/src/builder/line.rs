//! The line builder.

use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use geosketch_types::{Contour, Geom, GeodeticPoint};

use crate::builder::{PointOutcome, ShapeBuilder};
use crate::capture::{CapturePolicy, CaptureSequence, CaptureState};
use crate::config::SketchConfiguration;
use crate::error::SketchError;
use crate::feedback::{Preview, Readout};
use crate::geodesy::GeodesyService;
use crate::record::{fields, AttributeValue, RowIdSource, ShapeKind, ShapeRecord};
use crate::units::{parse_positive, Azimuth, Distance};

/// How the line endpoints are determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineFromMode {
    /// Both endpoints are captured from pointer clicks; distance and azimuth are
    /// derived from them.
    #[default]
    Points,
    /// The start point is captured; the end point is computed from typed distance and
    /// azimuth values.
    BearingAndDistance,
}

/// Builds a geodetic line from two points or from a bearing and a distance.
pub struct LineBuilder {
    geodesy: Rc<dyn GeodesyService>,
    ids: RowIdSource,
    config: SketchConfiguration,
    sequence: CaptureSequence,
    mode: LineFromMode,
    distance: Option<Distance>,
    azimuth: Option<Azimuth>,
    computed_end: Option<GeodeticPoint>,
}

impl LineBuilder {
    /// Creates a new builder.
    pub fn new(
        geodesy: Rc<dyn GeodesyService>,
        ids: RowIdSource,
        config: SketchConfiguration,
    ) -> Self {
        Self {
            geodesy,
            ids,
            config,
            sequence: CaptureSequence::new(CapturePolicy::two_point()),
            mode: LineFromMode::default(),
            distance: None,
            azimuth: None,
            computed_end: None,
        }
    }

    /// Current endpoint determination mode.
    pub fn mode(&self) -> LineFromMode {
        self.mode
    }

    /// Switches the endpoint determination mode.
    ///
    /// Captured points are discarded; typed distance and azimuth values are kept.
    pub fn set_mode(&mut self, mode: LineFromMode) {
        if self.mode != mode {
            self.mode = mode;
            self.sequence.reset();
            self.computed_end = None;
        }
    }

    /// Line length, if known.
    pub fn distance(&self) -> Option<Distance> {
        self.distance
    }

    /// Line azimuth, if known.
    pub fn azimuth(&self) -> Option<Azimuth> {
        self.azimuth
    }

    /// Mutable access to the session configuration (unit selections).
    pub fn config_mut(&mut self) -> &mut SketchConfiguration {
        &mut self.config
    }

    /// Sets the line length from a value in the session's distance unit.
    ///
    /// In bearing-and-distance mode the end point and preview are recomputed.
    pub async fn set_distance(&mut self, value: f64) -> Result<Option<Preview>, SketchError> {
        self.distance = Some(Distance::from_value(value, self.config.distance_unit())?);
        self.recompute_end().await
    }

    /// Sets the line length from user-entered text.
    pub async fn set_distance_text(&mut self, text: &str) -> Result<Option<Preview>, SketchError> {
        let value = parse_positive(text)?;
        self.set_distance(value).await
    }

    /// Sets the azimuth from a value in the session's angular unit.
    ///
    /// In bearing-and-distance mode the end point and preview are recomputed.
    pub async fn set_azimuth(&mut self, value: f64) -> Result<Option<Preview>, SketchError> {
        self.azimuth = Some(Azimuth::from_value(value, self.config.azimuth_unit()));
        self.recompute_end().await
    }

    /// Sets the azimuth from user-entered text.
    pub async fn set_azimuth_text(&mut self, text: &str) -> Result<Option<Preview>, SketchError> {
        let value = text
            .trim()
            .parse()
            .map_err(|_| SketchError::UnparsableNumber(text.to_string()))?;
        self.set_azimuth(value).await
    }

    fn readout(&self) -> Readout {
        Readout {
            distance: self.distance.map(|d| d.in_unit(self.config.distance_unit())),
            distance_unit: Some(self.config.distance_unit()),
            azimuth: self.azimuth.map(|a| a.in_unit(self.config.azimuth_unit())),
            azimuth_unit: Some(self.config.azimuth_unit()),
            ..Default::default()
        }
    }

    async fn recompute_end(&mut self) -> Result<Option<Preview>, SketchError> {
        if self.mode != LineFromMode::BearingAndDistance {
            return Ok(None);
        }
        let (Some(start), Some(distance), Some(azimuth)) =
            (self.sequence.first(), self.distance, self.azimuth)
        else {
            return Ok(None);
        };

        let end = self
            .geodesy
            .point_from_distance_bearing(
                start,
                distance.meters(),
                azimuth.degrees(),
                self.config.method(),
            )
            .await?;
        self.computed_end = Some(end);

        Ok(Some(Preview {
            geometry: Geom::Contour(Contour::open(vec![start, end])),
            readout: self.readout(),
        }))
    }

}

#[async_trait(?Send)]
impl ShapeBuilder for LineBuilder {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Line
    }

    fn capture_state(&self) -> CaptureState {
        self.sequence.state()
    }

    fn can_commit(&self) -> bool {
        match self.mode {
            LineFromMode::Points => self.sequence.is_ready(),
            LineFromMode::BearingAndDistance => {
                !self.sequence.is_empty() && self.distance.is_some() && self.azimuth.is_some()
            }
        }
    }

    async fn add_point(&mut self, point: GeodeticPoint) -> Result<PointOutcome, SketchError> {
        match self.mode {
            LineFromMode::Points => {
                if self.sequence.is_ready() {
                    return Ok(PointOutcome::Ignored);
                }
                let Some(start) = self.sequence.first() else {
                    self.sequence.push(point);
                    return Ok(PointOutcome::Accepted(None));
                };

                // The point enters the sequence only after the measurement succeeds,
                // so a failed service call leaves the session open for a retry click.
                let inverse = self
                    .geodesy
                    .distance_and_bearing(start, point, self.config.method())
                    .await?;
                self.distance = Some(Distance::from_meters(inverse.distance_m)?);
                self.azimuth = Some(Azimuth::from_degrees(inverse.azimuth_deg));
                self.sequence.push(point);
                Ok(PointOutcome::Completed)
            }
            LineFromMode::BearingAndDistance => {
                if !self.sequence.is_empty() {
                    return Ok(PointOutcome::Ignored);
                }
                self.sequence.push(point);
                let preview = self.recompute_end().await?;
                Ok(PointOutcome::Accepted(preview))
            }
        }
    }

    async fn pointer_moved(
        &mut self,
        point: GeodeticPoint,
    ) -> Result<Option<Preview>, SketchError> {
        if self.mode != LineFromMode::Points || self.sequence.len() != 1 {
            return Ok(None);
        }

        let start = self.sequence.points()[0];
        let inverse = self
            .geodesy
            .distance_and_bearing(start, point, self.config.method())
            .await?;

        Ok(Some(Preview {
            geometry: Geom::Contour(Contour::open(vec![start, point])),
            readout: Readout {
                distance: Some(Distance::from_meters(inverse.distance_m)?
                    .in_unit(self.config.distance_unit())),
                distance_unit: Some(self.config.distance_unit()),
                azimuth: Some(
                    Azimuth::from_degrees(inverse.azimuth_deg)
                        .in_unit(self.config.azimuth_unit()),
                ),
                azimuth_unit: Some(self.config.azimuth_unit()),
                ..Default::default()
            },
        }))
    }

    fn cancel(&mut self) {
        self.sequence.reset();
        self.distance = None;
        self.azimuth = None;
        self.computed_end = None;
    }

    async fn commit(&mut self) -> Result<Vec<ShapeRecord>, SketchError> {
        let start = self
            .sequence
            .first()
            .ok_or(SketchError::IncompleteShape("line start point is missing"))?;

        let end = match self.mode {
            LineFromMode::Points => *self
                .sequence
                .points()
                .get(1)
                .ok_or(SketchError::IncompleteShape("line end point is missing"))?,
            LineFromMode::BearingAndDistance => {
                let azimuth = self.azimuth.ok_or(SketchError::MissingAzimuth)?;
                let distance = self
                    .distance
                    .ok_or(SketchError::IncompleteShape("line distance is missing"))?;
                match self.computed_end {
                    Some(end) => end,
                    None => {
                        self.geodesy
                            .point_from_distance_bearing(
                                start,
                                distance.meters(),
                                azimuth.degrees(),
                                self.config.method(),
                            )
                            .await?
                    }
                }
            }
        };

        let distance = self
            .distance
            .ok_or(SketchError::IncompleteShape("line distance is missing"))?;
        let azimuth = self.azimuth.ok_or(SketchError::MissingAzimuth)?;

        let record = ShapeRecord::new(
            self.ids.next_id(),
            ShapeKind::Line,
            Geom::Contour(Contour::open(vec![start, end])),
            HashMap::from([
                (
                    fields::DISTANCE.to_string(),
                    AttributeValue::Float(distance.meters()),
                ),
                (
                    fields::ANGLE.to_string(),
                    AttributeValue::Float(azimuth.degrees()),
                ),
            ]),
        );

        self.cancel();
        Ok(vec![record])
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use approx::assert_relative_eq;
    use assert_matches::assert_matches;
    use geosketch_types::latlon;
    use tokio_test::block_on;

    use super::*;
    use crate::geodesy::{InverseResult, LineConstructionMethod, SphericalGeodesy};
    use crate::units::AngularUnit;

    /// Delegates to a spherical backend, failing the next inverse call on demand.
    struct FlakyGeodesy {
        inner: SphericalGeodesy,
        fail_next: Cell<bool>,
    }

    #[async_trait(?Send)]
    impl GeodesyService for FlakyGeodesy {
        async fn distance_and_bearing(
            &self,
            p1: GeodeticPoint,
            p2: GeodeticPoint,
            method: LineConstructionMethod,
        ) -> Result<InverseResult, SketchError> {
            if self.fail_next.take() {
                return Err(SketchError::Geodesy("service unavailable".to_string()));
            }
            self.inner.distance_and_bearing(p1, p2, method).await
        }

        async fn point_from_distance_bearing(
            &self,
            origin: GeodeticPoint,
            distance_m: f64,
            azimuth_deg: f64,
            method: LineConstructionMethod,
        ) -> Result<GeodeticPoint, SketchError> {
            self.inner
                .point_from_distance_bearing(origin, distance_m, azimuth_deg, method)
                .await
        }

        async fn circle_geometry(
            &self,
            center: GeodeticPoint,
            radius_m: f64,
            method: LineConstructionMethod,
        ) -> Result<Contour<GeodeticPoint>, SketchError> {
            self.inner.circle_geometry(center, radius_m, method).await
        }

        async fn ellipse_geometry(
            &self,
            center: GeodeticPoint,
            major_m: f64,
            minor_m: f64,
            azimuth_deg: f64,
            method: LineConstructionMethod,
        ) -> Result<Contour<GeodeticPoint>, SketchError> {
            self.inner
                .ellipse_geometry(center, major_m, minor_m, azimuth_deg, method)
                .await
        }
    }

    fn builder() -> LineBuilder {
        LineBuilder::new(
            Rc::new(SphericalGeodesy::default()),
            RowIdSource::new(),
            SketchConfiguration::default(),
        )
    }

    #[test]
    fn two_clicks_complete_the_line() {
        let mut line = builder();
        assert_matches!(
            block_on(line.add_point(latlon!(0.0, 0.0))),
            Ok(PointOutcome::Accepted(None))
        );
        assert_matches!(
            block_on(line.add_point(latlon!(0.0, 1.0))),
            Ok(PointOutcome::Completed)
        );

        // Derived azimuth for a due-east line.
        assert_relative_eq!(line.azimuth().expect("azimuth derived").degrees(), 90.0);
        assert!(line.distance().expect("distance derived").meters() > 0.0);
    }

    #[test]
    fn failed_measurement_keeps_session_retryable() {
        let geodesy = Rc::new(FlakyGeodesy {
            inner: SphericalGeodesy::default(),
            fail_next: Cell::new(false),
        });
        let mut line = LineBuilder::new(
            geodesy.clone(),
            RowIdSource::new(),
            SketchConfiguration::default(),
        );
        block_on(line.add_point(latlon!(0.0, 0.0))).expect("first point");

        geodesy.fail_next.set(true);
        assert_matches!(
            block_on(line.add_point(latlon!(0.0, 1.0))),
            Err(SketchError::Geodesy(_))
        );
        // The failed point was not captured; the session is in its pre-call state.
        assert_eq!(line.capture_state(), CaptureState::AwaitingPoint2);
        assert!(line.distance().is_none());
        assert!(line.azimuth().is_none());

        // The next click retries and completes normally.
        assert_matches!(
            block_on(line.add_point(latlon!(0.0, 1.0))),
            Ok(PointOutcome::Completed)
        );
        assert!(line.can_commit());
    }

    #[test]
    fn third_point_is_ignored() {
        let mut line = builder();
        block_on(line.add_point(latlon!(0.0, 0.0))).expect("first point");
        block_on(line.add_point(latlon!(0.0, 1.0))).expect("second point");

        assert_matches!(
            block_on(line.add_point(latlon!(1.0, 1.0))),
            Ok(PointOutcome::Ignored)
        );
    }

    #[test]
    fn pointer_move_previews_distance_and_azimuth() {
        let mut line = builder();
        block_on(line.add_point(latlon!(0.0, 0.0))).expect("first point");

        let preview = block_on(line.pointer_moved(latlon!(0.0, 0.5)))
            .expect("preview computed")
            .expect("preview available");
        assert_relative_eq!(preview.readout.azimuth.expect("azimuth readout"), 90.0);
        assert!(preview.readout.distance.expect("distance readout") > 0.0);
        assert_matches!(preview.geometry, Geom::Contour(_));
    }

    #[test]
    fn bearing_and_distance_computes_end_point() {
        let mut line = builder();
        line.set_mode(LineFromMode::BearingAndDistance);
        block_on(line.add_point(latlon!(10.0, 20.0))).expect("start point");

        block_on(line.set_distance_text("5000")).expect("distance set");
        let preview = block_on(line.set_azimuth(45.0))
            .expect("azimuth set")
            .expect("preview recomputed");
        assert_matches!(preview.geometry, Geom::Contour(_));
        assert!(line.can_commit());

        let records = block_on(line.commit()).expect("line commits");
        assert_eq!(records.len(), 1);
        assert_matches!(
            records[0].attribute(fields::DISTANCE),
            Some(AttributeValue::Float(d)) if (d - 5000.0).abs() < 1e-9
        );
        assert_matches!(
            records[0].attribute(fields::ANGLE),
            Some(AttributeValue::Float(a)) if (a - 45.0).abs() < 1e-9
        );
    }

    #[test]
    fn mode_switch_resets_points() {
        let mut line = builder();
        block_on(line.add_point(latlon!(0.0, 0.0))).expect("first point");
        line.set_mode(LineFromMode::BearingAndDistance);

        assert_eq!(line.capture_state(), CaptureState::AwaitingPoint1);
        assert!(!line.can_commit());
    }

    #[test]
    fn commit_without_azimuth_fails() {
        let mut line = builder();
        line.set_mode(LineFromMode::BearingAndDistance);
        block_on(line.add_point(latlon!(0.0, 0.0))).expect("start point");
        block_on(line.set_distance(100.0)).expect("distance set");

        assert_matches!(
            block_on(line.commit()),
            Err(SketchError::MissingAzimuth)
        );
        // Failed commit leaves the session intact.
        assert!(!line.sequence.is_empty());
    }

    #[test]
    fn azimuth_in_mils_is_stored_in_degrees() {
        let mut line = builder();
        line.config_mut().set_azimuth_unit(AngularUnit::Mils);
        line.set_mode(LineFromMode::BearingAndDistance);
        block_on(line.set_azimuth(1600.0)).expect("azimuth set");

        assert_relative_eq!(line.azimuth().expect("azimuth stored").degrees(), 90.0);
    }
}
