//! The ellipse builder.

use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use geosketch_types::{Contour, Geom, GeodeticPoint, Polygon};

use crate::builder::{PointOutcome, ShapeBuilder};
use crate::capture::{CapturePolicy, CaptureSequence, CaptureState};
use crate::config::SketchConfiguration;
use crate::error::SketchError;
use crate::feedback::{Preview, Readout};
use crate::geodesy::GeodesyService;
use crate::record::{fields, AttributeValue, RowIdSource, ShapeKind, ShapeRecord};
use crate::units::{parse_positive, AngularUnit, Azimuth, Distance};

/// Whether axis values are displayed as semi-axes or full axes.
///
/// Stored geometry always uses semi-axis lengths; full mode only doubles the
/// displayed strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisMode {
    /// Displayed values are the semi-axis lengths.
    #[default]
    Semi,
    /// Displayed values are the full axis lengths (twice the stored semi-axes).
    Full,
}

/// Builds a geodetic ellipse from a center, a major-axis point and a minor-axis point.
///
/// The third capture point is constrained to the line perpendicular to the major axis
/// at the center: only its distance from the center is used, applied along that
/// perpendicular. A candidate minor axis longer than the major axis is rejected and
/// the previous valid preview retained, so the session can never hold an inconsistent
/// ellipse.
pub struct EllipseBuilder {
    geodesy: Rc<dyn GeodesyService>,
    ids: RowIdSource,
    config: SketchConfiguration,
    sequence: CaptureSequence,
    major: Option<Distance>,
    minor: Option<Distance>,
    azimuth: Option<Azimuth>,
    axis_mode: AxisMode,
    // Geometry and minor length (meters) of the last valid candidate; the readout is
    // rebuilt from the current unit selections every time it is served.
    last_minor_preview: Option<(Geom<GeodeticPoint>, f64)>,
}

impl EllipseBuilder {
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
            sequence: CaptureSequence::new(CapturePolicy::three_point()),
            major: None,
            minor: None,
            azimuth: None,
            axis_mode: AxisMode::default(),
            last_minor_preview: None,
        }
    }

    /// Major semi-axis, if known.
    pub fn major_axis(&self) -> Option<Distance> {
        self.major
    }

    /// Minor semi-axis, if known.
    pub fn minor_axis(&self) -> Option<Distance> {
        self.minor
    }

    /// Azimuth of the major axis, if known.
    pub fn azimuth(&self) -> Option<Azimuth> {
        self.azimuth
    }

    /// Current axis display mode.
    pub fn axis_mode(&self) -> AxisMode {
        self.axis_mode
    }

    /// Switches between semi and full axis display. Stored values are unchanged.
    pub fn set_axis_mode(&mut self, mode: AxisMode) {
        self.axis_mode = mode;
    }

    /// Mutable access to the session configuration (unit selections).
    pub fn config_mut(&mut self) -> &mut SketchConfiguration {
        &mut self.config
    }

    /// The major axis value as displayed: semi or full, in the session's unit.
    pub fn displayed_major(&self) -> Option<f64> {
        self.display_value(self.major)
    }

    /// The minor axis value as displayed: semi or full, in the session's unit.
    pub fn displayed_minor(&self) -> Option<f64> {
        self.display_value(self.minor)
    }

    fn display_value(&self, axis: Option<Distance>) -> Option<f64> {
        let value = axis?.in_unit(self.config.distance_unit());
        Some(match self.axis_mode {
            AxisMode::Semi => value,
            AxisMode::Full => value * 2.0,
        })
    }

    fn stored_from_display(&self, value: f64) -> f64 {
        match self.axis_mode {
            AxisMode::Semi => value,
            AxisMode::Full => value / 2.0,
        }
    }

    /// Sets the major semi-axis from a displayed value in the session's unit.
    ///
    /// If the stored minor axis now exceeds the major one it is clamped down to keep
    /// the invariant. Recomputes the major-axis endpoint preview when possible.
    pub async fn set_major(&mut self, value: f64) -> Result<Option<Preview>, SketchError> {
        let major = Distance::from_value(
            self.stored_from_display(value),
            self.config.distance_unit(),
        )?;
        self.major = Some(major);
        if let Some(minor) = self.minor {
            if minor > major {
                log::warn!(
                    "minor axis {} m clamped to new major axis {} m",
                    minor.meters(),
                    major.meters()
                );
                self.minor = Some(major);
            }
        }
        self.major_endpoint_preview().await
    }

    /// Sets the major semi-axis from user-entered text.
    pub async fn set_major_text(&mut self, text: &str) -> Result<Option<Preview>, SketchError> {
        let value = parse_positive(text)?;
        self.set_major(value).await
    }

    /// Sets the minor semi-axis from a displayed value in the session's unit.
    ///
    /// A value exceeding the current major axis is a validation error; the previous
    /// minor value is retained.
    pub fn set_minor(&mut self, value: f64) -> Result<(), SketchError> {
        let minor = Distance::from_value(
            self.stored_from_display(value),
            self.config.distance_unit(),
        )?;
        if let Some(major) = self.major {
            if minor > major {
                return Err(SketchError::MinorAxisExceedsMajor {
                    minor: minor.meters(),
                    major: major.meters(),
                });
            }
        }
        self.minor = Some(minor);
        Ok(())
    }

    /// Sets the minor semi-axis from user-entered text.
    pub fn set_minor_text(&mut self, text: &str) -> Result<(), SketchError> {
        let value = parse_positive(text)?;
        self.set_minor(value)
    }

    /// Sets the major-axis azimuth from a value in the session's angular unit and
    /// recomputes the endpoint preview.
    pub async fn set_azimuth(&mut self, value: f64) -> Result<Option<Preview>, SketchError> {
        self.azimuth = Some(Azimuth::from_value(value, self.config.azimuth_unit()));
        self.major_endpoint_preview().await
    }

    /// Changes the angular unit used for azimuth display.
    ///
    /// The stored azimuth is canonical degrees, so the displayed value is re-derived
    /// rather than converted in place. The major-axis endpoint preview is recomputed.
    pub async fn set_azimuth_unit(
        &mut self,
        unit: AngularUnit,
    ) -> Result<Option<Preview>, SketchError> {
        self.config.set_azimuth_unit(unit);
        self.major_endpoint_preview().await
    }

    /// Azimuth as displayed, in the session's angular unit.
    pub fn displayed_azimuth(&self) -> Option<f64> {
        Some(self.azimuth?.in_unit(self.config.azimuth_unit()))
    }

    async fn major_endpoint_preview(&mut self) -> Result<Option<Preview>, SketchError> {
        let (Some(center), Some(major), Some(azimuth)) =
            (self.sequence.first(), self.major, self.azimuth)
        else {
            return Ok(None);
        };

        let end = self
            .geodesy
            .point_from_distance_bearing(
                center,
                major.meters(),
                azimuth.degrees(),
                self.config.method(),
            )
            .await?;

        Ok(Some(Preview {
            geometry: Geom::Contour(Contour::open(vec![center, end])),
            readout: self.readout(),
        }))
    }

    fn readout(&self) -> Readout {
        Readout {
            distance: self.displayed_major(),
            distance_unit: Some(self.config.distance_unit()),
            azimuth: self.displayed_azimuth(),
            azimuth_unit: Some(self.config.azimuth_unit()),
            ..Default::default()
        }
    }

    fn minor_readout(&self, minor_m: f64) -> Readout {
        Readout {
            distance: Distance::from_meters(minor_m)
                .ok()
                .map(|d| d.in_unit(self.config.distance_unit())),
            distance_unit: Some(self.config.distance_unit()),
            azimuth: self.displayed_azimuth(),
            azimuth_unit: Some(self.config.azimuth_unit()),
            ..Default::default()
        }
    }

    async fn minor_candidate_preview(
        &mut self,
        candidate_m: f64,
    ) -> Result<Option<Preview>, SketchError> {
        let (Some(center), Some(major), Some(azimuth)) =
            (self.sequence.first(), self.major, self.azimuth)
        else {
            return Ok(None);
        };

        if candidate_m > major.meters() {
            // Rejected candidate; keep showing the last valid geometry, with the
            // readout re-expressed in whatever units are selected now.
            return Ok(self
                .last_minor_preview
                .as_ref()
                .map(|(geometry, minor_m)| Preview {
                    geometry: geometry.clone(),
                    readout: self.minor_readout(*minor_m),
                }));
        }
        if candidate_m <= 0.0 {
            return Ok(None);
        }

        let outline = self
            .geodesy
            .ellipse_geometry(
                center,
                major.meters(),
                candidate_m,
                azimuth.degrees(),
                self.config.method(),
            )
            .await?;

        let geometry = Geom::Contour(outline);
        self.last_minor_preview = Some((geometry.clone(), candidate_m));
        Ok(Some(Preview {
            readout: self.minor_readout(candidate_m),
            geometry,
        }))
    }
}

#[async_trait(?Send)]
impl ShapeBuilder for EllipseBuilder {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Ellipse
    }

    fn capture_state(&self) -> CaptureState {
        self.sequence.state()
    }

    fn can_commit(&self) -> bool {
        !self.sequence.is_empty()
            && self.major.is_some()
            && self.minor.is_some()
            && self.azimuth.is_some()
    }

    async fn add_point(&mut self, point: GeodeticPoint) -> Result<PointOutcome, SketchError> {
        match self.sequence.len() {
            0 => {
                self.sequence.push(point);
                Ok(PointOutcome::Accepted(None))
            }
            1 => {
                let center = self.sequence.points()[0];
                let inverse = self
                    .geodesy
                    .distance_and_bearing(center, point, self.config.method())
                    .await?;
                if inverse.distance_m <= 0.0 {
                    log::debug!("ignoring zero-length major axis point");
                    return Ok(PointOutcome::Ignored);
                }

                self.major = Some(Distance::from_meters(inverse.distance_m)?);
                self.azimuth = Some(Azimuth::from_degrees(inverse.azimuth_deg));
                self.sequence.push(point);
                Ok(PointOutcome::Accepted(None))
            }
            2 => {
                let center = self.sequence.points()[0];
                let major = self
                    .major
                    .ok_or(SketchError::IncompleteShape("major axis is missing"))?;
                let inverse = self
                    .geodesy
                    .distance_and_bearing(center, point, self.config.method())
                    .await?;

                if inverse.distance_m <= 0.0 {
                    return Ok(PointOutcome::Ignored);
                }
                if inverse.distance_m > major.meters() {
                    // An inconsistent ellipse is never captured; the point is
                    // rejected and the previous valid preview stays on screen.
                    log::debug!(
                        "rejecting minor axis point: {} m exceeds major axis {} m",
                        inverse.distance_m,
                        major.meters()
                    );
                    return Ok(PointOutcome::Ignored);
                }

                self.minor = Some(Distance::from_meters(inverse.distance_m)?);
                self.sequence.push(point);
                Ok(PointOutcome::Completed)
            }
            _ => Ok(PointOutcome::Ignored),
        }
    }

    async fn pointer_moved(
        &mut self,
        point: GeodeticPoint,
    ) -> Result<Option<Preview>, SketchError> {
        match self.sequence.len() {
            1 => {
                // Dragging the major axis endpoint.
                let center = self.sequence.points()[0];
                let inverse = self
                    .geodesy
                    .distance_and_bearing(center, point, self.config.method())
                    .await?;
                if inverse.distance_m <= 0.0 {
                    return Ok(None);
                }

                Ok(Some(Preview {
                    geometry: Geom::Contour(Contour::open(vec![center, point])),
                    readout: Readout {
                        distance: Some(
                            Distance::from_meters(inverse.distance_m)?
                                .in_unit(self.config.distance_unit()),
                        ),
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
            2 => {
                let center = self.sequence.points()[0];
                let inverse = self
                    .geodesy
                    .distance_and_bearing(center, point, self.config.method())
                    .await?;
                self.minor_candidate_preview(inverse.distance_m).await
            }
            _ => Ok(None),
        }
    }

    fn cancel(&mut self) {
        self.sequence.reset();
        self.major = None;
        self.minor = None;
        self.azimuth = None;
        self.last_minor_preview = None;
    }

    async fn commit(&mut self) -> Result<Vec<ShapeRecord>, SketchError> {
        let center = self
            .sequence
            .first()
            .ok_or(SketchError::IncompleteShape("ellipse center is missing"))?;
        let major = self
            .major
            .ok_or(SketchError::IncompleteShape("major axis is missing"))?;
        let minor = self
            .minor
            .ok_or(SketchError::IncompleteShape("minor axis is missing"))?;
        let azimuth = self.azimuth.ok_or(SketchError::MissingAzimuth)?;

        // The setters keep minor <= major at all times; the stored geometry uses the
        // semi-axis lengths whatever the display mode.
        let minor = if minor > major { major } else { minor };
        // Committed ellipses are areas; the preview stays a curve.
        let polygon: Polygon<GeodeticPoint> = self
            .geodesy
            .ellipse_geometry(
                center,
                major.meters(),
                minor.meters(),
                azimuth.degrees(),
                self.config.method(),
            )
            .await?
            .into_closed()
            .ok_or_else(|| SketchError::Geodesy("ellipse outline is not closed".to_string()))?
            .into();

        let record = ShapeRecord::new(
            self.ids.next_id(),
            ShapeKind::Ellipse,
            Geom::Polygon(polygon),
            HashMap::from([
                (
                    fields::MAJOR_AXIS.to_string(),
                    AttributeValue::Float(major.meters()),
                ),
                (
                    fields::MINOR_AXIS.to_string(),
                    AttributeValue::Float(minor.meters()),
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
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;
    use geosketch_types::latlon;
    use tokio_test::block_on;

    use super::*;
    use crate::geodesy::SphericalGeodesy;
    use crate::units::DistanceUnit;

    fn builder() -> EllipseBuilder {
        EllipseBuilder::new(
            Rc::new(SphericalGeodesy::default()),
            RowIdSource::new(),
            SketchConfiguration::default(),
        )
    }

    fn capture_two(ellipse: &mut EllipseBuilder) {
        block_on(ellipse.add_point(latlon!(0.0, 0.0))).expect("center");
        // Roughly one degree east along the equator: major axis ~111 km at 90 deg.
        block_on(ellipse.add_point(latlon!(0.0, 1.0))).expect("major point");
    }

    #[test]
    fn second_point_derives_major_and_azimuth() {
        let mut ellipse = builder();
        capture_two(&mut ellipse);

        assert_eq!(ellipse.capture_state(), CaptureState::AwaitingPoint3);
        assert_relative_eq!(
            ellipse.azimuth().expect("azimuth derived").degrees(),
            90.0,
            epsilon = 1e-9
        );
        assert!(ellipse.major_axis().expect("major derived").meters() > 100_000.0);
    }

    #[test]
    fn oversized_minor_point_is_rejected() {
        let mut ellipse = builder();
        capture_two(&mut ellipse);

        // Two degrees north is farther than one degree of major axis.
        assert_matches!(
            block_on(ellipse.add_point(latlon!(2.0, 0.0))),
            Ok(PointOutcome::Ignored)
        );
        assert_eq!(ellipse.capture_state(), CaptureState::AwaitingPoint3);
        assert!(ellipse.minor_axis().is_none());

        // A point inside the major axis completes the shape.
        assert_matches!(
            block_on(ellipse.add_point(latlon!(0.5, 0.0))),
            Ok(PointOutcome::Completed)
        );
        let minor = ellipse.minor_axis().expect("minor derived");
        assert!(minor <= ellipse.major_axis().expect("major"));
    }

    #[test]
    fn oversized_minor_preview_retains_previous() {
        let mut ellipse = builder();
        capture_two(&mut ellipse);

        let valid = block_on(ellipse.pointer_moved(latlon!(0.5, 0.0)))
            .expect("preview computed")
            .expect("valid candidate previews");

        let retained = block_on(ellipse.pointer_moved(latlon!(2.0, 0.0)))
            .expect("preview computed")
            .expect("previous preview retained");
        assert_eq!(retained, valid);
    }

    #[test]
    fn retained_preview_readout_follows_unit_changes() {
        let mut ellipse = builder();
        capture_two(&mut ellipse);

        let valid = block_on(ellipse.pointer_moved(latlon!(0.5, 0.0)))
            .expect("preview computed")
            .expect("valid candidate previews");
        let meters = valid.readout.distance.expect("meter readout");

        // The unit switch happens between the valid candidate and the rejected one;
        // the retained readout must use the new unit, not the one it was cached with.
        ellipse.config_mut().set_distance_unit(DistanceUnit::Kilometers);
        let retained = block_on(ellipse.pointer_moved(latlon!(2.0, 0.0)))
            .expect("preview computed")
            .expect("previous preview retained");

        assert_eq!(retained.geometry, valid.geometry);
        assert_eq!(retained.readout.distance_unit, Some(DistanceUnit::Kilometers));
        assert_relative_eq!(
            retained.readout.distance.expect("kilometer readout"),
            meters / 1000.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn typed_minor_exceeding_major_fails() {
        let mut ellipse = builder();
        block_on(ellipse.add_point(latlon!(0.0, 0.0))).expect("center");
        block_on(ellipse.set_major(1000.0)).expect("major set");
        block_on(ellipse.set_azimuth(0.0)).expect("azimuth set");

        assert_matches!(
            ellipse.set_minor(1500.0),
            Err(SketchError::MinorAxisExceedsMajor { .. })
        );
        assert!(ellipse.minor_axis().is_none());

        ellipse.set_minor(800.0).expect("valid minor");
        assert!(ellipse.can_commit());

        let records = block_on(ellipse.commit()).expect("ellipse commits");
        assert_matches!(records[0].geometry(), Geom::Polygon(_));
        assert_matches!(
            records[0].attribute(fields::MAJOR_AXIS),
            Some(AttributeValue::Float(d)) if (d - 1000.0).abs() < 1e-9
        );
        assert_matches!(
            records[0].attribute(fields::MINOR_AXIS),
            Some(AttributeValue::Float(d)) if (d - 800.0).abs() < 1e-9
        );
    }

    #[test]
    fn shrinking_major_clamps_minor() {
        let mut ellipse = builder();
        block_on(ellipse.set_major(1000.0)).expect("major set");
        ellipse.set_minor(900.0).expect("minor set");

        block_on(ellipse.set_major(500.0)).expect("major shrunk");
        assert_relative_eq!(ellipse.minor_axis().expect("minor clamped").meters(), 500.0);
    }

    #[test]
    fn full_axis_mode_affects_display_only() {
        let mut ellipse = builder();
        block_on(ellipse.set_major(1000.0)).expect("major set");
        ellipse.set_axis_mode(AxisMode::Full);

        assert_relative_eq!(ellipse.displayed_major().expect("displayed"), 2000.0);
        assert_relative_eq!(ellipse.major_axis().expect("stored").meters(), 1000.0);

        // Written values in full mode are halved before storage.
        block_on(ellipse.set_major(3000.0)).expect("major set in full mode");
        assert_relative_eq!(ellipse.major_axis().expect("stored").meters(), 1500.0);
    }

    #[test]
    fn azimuth_unit_change_rederives_display() {
        let mut ellipse = builder();
        block_on(ellipse.set_azimuth(90.0)).expect("azimuth set");

        block_on(ellipse.set_azimuth_unit(AngularUnit::Mils)).expect("unit switched");
        assert_relative_eq!(ellipse.displayed_azimuth().expect("displayed"), 1600.0);
        assert_relative_eq!(ellipse.azimuth().expect("stored").degrees(), 90.0);
    }
}
