//! The circle builder.

use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use geosketch_types::{Geom, GeodeticPoint, Polygon};

use crate::builder::{PointOutcome, ShapeBuilder};
use crate::capture::{CapturePolicy, CaptureSequence, CaptureState};
use crate::config::SketchConfiguration;
use crate::error::SketchError;
use crate::feedback::{Preview, Readout};
use crate::geodesy::GeodesyService;
use crate::record::{fields, AttributeValue, RowIdSource, ShapeKind, ShapeRecord};
use crate::units::{parse_positive, travel_distance, Distance, RateUnit, TimeUnit};

/// Whether the displayed distance value is the radius or the diameter.
///
/// The stored distance is always the radius; this mode only affects how values are
/// shown and interpreted at the display boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RadiusMode {
    /// Displayed value equals the stored radius.
    #[default]
    Radius,
    /// Displayed value is twice the stored radius; written values are halved.
    Diameter,
}

/// Builds a geodesic circle from a center and a radius.
///
/// The radius can come from a second captured point, from a typed value, or from the
/// travel-time sub-calculator (`distance = rate × time`).
pub struct CircleBuilder {
    geodesy: Rc<dyn GeodesyService>,
    ids: RowIdSource,
    config: SketchConfiguration,
    sequence: CaptureSequence,
    radius: Option<Distance>,
    radius_mode: RadiusMode,
    travel_time: Option<f64>,
    time_unit: TimeUnit,
    travel_rate: Option<f64>,
    rate_unit: RateUnit,
}

impl CircleBuilder {
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
            radius: None,
            radius_mode: RadiusMode::default(),
            travel_time: None,
            time_unit: TimeUnit::default(),
            travel_rate: None,
            rate_unit: RateUnit::default(),
        }
    }

    /// Stored radius, if known. Always the radius, regardless of [`RadiusMode`].
    pub fn radius(&self) -> Option<Distance> {
        self.radius
    }

    /// Current display interpretation of the distance value.
    pub fn radius_mode(&self) -> RadiusMode {
        self.radius_mode
    }

    /// Switches between radius and diameter display. The stored radius is unchanged.
    pub fn set_radius_mode(&mut self, mode: RadiusMode) {
        self.radius_mode = mode;
    }

    /// Mutable access to the session configuration (unit selections).
    pub fn config_mut(&mut self) -> &mut SketchConfiguration {
        &mut self.config
    }

    /// The distance value as it should be displayed: radius or diameter, in the
    /// session's distance unit.
    pub fn displayed_distance(&self) -> Option<f64> {
        let radius = self.radius?.in_unit(self.config.distance_unit());
        Some(match self.radius_mode {
            RadiusMode::Radius => radius,
            RadiusMode::Diameter => radius * 2.0,
        })
    }

    /// Sets the distance from a displayed value in the session's distance unit.
    ///
    /// In diameter mode the value is halved before being stored.
    pub fn set_distance(&mut self, value: f64) -> Result<(), SketchError> {
        let radius_value = match self.radius_mode {
            RadiusMode::Radius => value,
            RadiusMode::Diameter => value / 2.0,
        };
        self.radius = Some(Distance::from_value(
            radius_value,
            self.config.distance_unit(),
        )?);
        Ok(())
    }

    /// Sets the distance from user-entered text.
    pub fn set_distance_text(&mut self, text: &str) -> Result<(), SketchError> {
        let value = parse_positive(text)?;
        self.set_distance(value)
    }

    /// Sets the travel time and recomputes the radius if a rate is present.
    pub fn set_travel_time(&mut self, time: f64) -> Result<(), SketchError> {
        if time < 0.0 || !time.is_finite() {
            return Err(SketchError::NegativeDistance(time));
        }
        self.travel_time = Some(time);
        self.recompute_travel()
    }

    /// Sets the travel rate and recomputes the radius if a time is present.
    pub fn set_travel_rate(&mut self, rate: f64) -> Result<(), SketchError> {
        if rate < 0.0 || !rate.is_finite() {
            return Err(SketchError::NegativeDistance(rate));
        }
        self.travel_rate = Some(rate);
        self.recompute_travel()
    }

    /// Sets the unit of the travel time value and recomputes the radius.
    pub fn set_time_unit(&mut self, unit: TimeUnit) -> Result<(), SketchError> {
        self.time_unit = unit;
        self.recompute_travel()
    }

    /// Sets the unit of the travel rate value and recomputes the radius.
    pub fn set_rate_unit(&mut self, unit: RateUnit) -> Result<(), SketchError> {
        self.rate_unit = unit;
        self.recompute_travel()
    }

    fn recompute_travel(&mut self) -> Result<(), SketchError> {
        let (Some(time), Some(rate)) = (self.travel_time, self.travel_rate) else {
            return Ok(());
        };
        // The travel calculator drives the radius directly; the radius/diameter
        // display mode does not apply to computed distances.
        self.radius = Some(travel_distance(rate, self.rate_unit, time, self.time_unit)?);
        Ok(())
    }

    fn readout(&self) -> Readout {
        Readout {
            distance: self.displayed_distance(),
            distance_unit: Some(self.config.distance_unit()),
            ..Default::default()
        }
    }
}

#[async_trait(?Send)]
impl ShapeBuilder for CircleBuilder {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Circle
    }

    fn capture_state(&self) -> CaptureState {
        self.sequence.state()
    }

    fn can_commit(&self) -> bool {
        !self.sequence.is_empty() && self.radius.is_some_and(|r| !r.is_zero())
    }

    async fn add_point(&mut self, point: GeodeticPoint) -> Result<PointOutcome, SketchError> {
        if self.sequence.is_empty() {
            self.sequence.push(point);
            return Ok(PointOutcome::Accepted(None));
        }
        if self.sequence.is_ready() {
            return Ok(PointOutcome::Ignored);
        }

        let center = self.sequence.points()[0];
        let inverse = self
            .geodesy
            .distance_and_bearing(center, point, self.config.method())
            .await?;
        if inverse.distance_m <= 0.0 {
            log::debug!("ignoring zero-radius circle point");
            return Ok(PointOutcome::Ignored);
        }

        self.radius = Some(Distance::from_meters(inverse.distance_m)?);
        self.sequence.push(point);
        Ok(PointOutcome::Completed)
    }

    async fn pointer_moved(
        &mut self,
        point: GeodeticPoint,
    ) -> Result<Option<Preview>, SketchError> {
        if self.sequence.len() != 1 {
            return Ok(None);
        }

        let center = self.sequence.points()[0];
        let inverse = self
            .geodesy
            .distance_and_bearing(center, point, self.config.method())
            .await?;
        if inverse.distance_m <= 0.0 {
            return Ok(None);
        }

        let outline = self
            .geodesy
            .circle_geometry(center, inverse.distance_m, self.config.method())
            .await?;

        let radius = Distance::from_meters(inverse.distance_m)?;
        let displayed = match self.radius_mode {
            RadiusMode::Radius => radius.in_unit(self.config.distance_unit()),
            RadiusMode::Diameter => radius.in_unit(self.config.distance_unit()) * 2.0,
        };

        Ok(Some(Preview {
            geometry: Geom::Contour(outline),
            readout: Readout {
                distance: Some(displayed),
                distance_unit: Some(self.config.distance_unit()),
                ..Default::default()
            },
        }))
    }

    fn cancel(&mut self) {
        self.sequence.reset();
        self.radius = None;
        self.travel_time = None;
        self.travel_rate = None;
    }

    async fn commit(&mut self) -> Result<Vec<ShapeRecord>, SketchError> {
        let center = self
            .sequence
            .first()
            .ok_or(SketchError::IncompleteShape("circle center is missing"))?;
        let radius = self
            .radius
            .filter(|r| !r.is_zero())
            .ok_or(SketchError::IncompleteShape("circle radius is missing"))?;

        // Committed circles are areas; the preview stays a curve.
        let polygon: Polygon<GeodeticPoint> = self
            .geodesy
            .circle_geometry(center, radius.meters(), self.config.method())
            .await?
            .into_closed()
            .ok_or_else(|| SketchError::Geodesy("circle outline is not closed".to_string()))?
            .into();

        let record = ShapeRecord::new(
            self.ids.next_id(),
            ShapeKind::Circle,
            Geom::Polygon(polygon),
            HashMap::from([
                (
                    fields::DISTANCE.to_string(),
                    AttributeValue::Float(radius.meters()),
                ),
                (
                    fields::DISTANCE_TYPE.to_string(),
                    AttributeValue::String(self.config.distance_unit().label().to_string()),
                ),
            ]),
        );

        self.cancel();
        Ok(vec![record])
    }
}
