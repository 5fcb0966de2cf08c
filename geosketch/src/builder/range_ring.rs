//! The range ring builder.

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
use crate::units::{parse_positive, Distance};

const MIN_RINGS: u32 = 1;
const MAX_RINGS: u32 = 180;
const MAX_RADIALS: u32 = 180;

/// How the rings are determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RingMode {
    /// Ring count and spacing are set up front; one click places the center.
    #[default]
    Fixed,
    /// Every click after the center adds one ring at the clicked distance;
    /// a double click ends the capture.
    Interactive,
}

/// Radii of a fixed ring set: `spacing × k` for k = 1..=count.
pub fn ring_radii(spacing_m: f64, count: u32) -> Vec<f64> {
    (1..=count).map(|k| spacing_m * k as f64).collect()
}

/// Evenly spaced radial azimuths starting at north.
///
/// The interval is `360° / count`. One legacy host doubled the count before dividing,
/// which produced twice the visual radial density; that behavior was a bug and is not
/// reproduced here.
pub fn radial_azimuths(count: u32) -> Vec<f64> {
    (0..count).map(|k| k as f64 * 360.0 / count as f64).collect()
}

/// Builds concentric range rings with optional radials from a common center.
pub struct RangeRingBuilder {
    geodesy: Rc<dyn GeodesyService>,
    ids: RowIdSource,
    config: SketchConfiguration,
    sequence: CaptureSequence,
    mode: RingMode,
    ring_count: u32,
    radial_count: u32,
    spacing: Option<Distance>,
    ring_radii_m: Vec<f64>,
    max_observed_m: f64,
}

impl RangeRingBuilder {
    /// Creates a new builder in fixed mode.
    pub fn new(
        geodesy: Rc<dyn GeodesyService>,
        ids: RowIdSource,
        config: SketchConfiguration,
    ) -> Self {
        Self {
            geodesy,
            ids,
            config,
            sequence: CaptureSequence::new(CapturePolicy::single_point()),
            mode: RingMode::default(),
            ring_count: MIN_RINGS,
            radial_count: 0,
            spacing: None,
            ring_radii_m: Vec::new(),
            max_observed_m: 0.0,
        }
    }

    /// Current ring determination mode.
    pub fn mode(&self) -> RingMode {
        self.mode
    }

    /// Switches between fixed and interactive mode, resetting the session.
    pub fn set_mode(&mut self, mode: RingMode) {
        self.mode = mode;
        self.cancel();
    }

    /// Number of rings: the configured count in fixed mode, the number of drawn rings
    /// in interactive mode.
    pub fn ring_count(&self) -> u32 {
        match self.mode {
            RingMode::Fixed => self.ring_count,
            RingMode::Interactive => self.ring_radii_m.len() as u32,
        }
    }

    /// Sets the number of rings for fixed mode. Must be within `[1, 180]`.
    pub fn set_ring_count(&mut self, count: u32) -> Result<(), SketchError> {
        if !(MIN_RINGS..=MAX_RINGS).contains(&count) {
            return Err(SketchError::RingCountOutOfBounds {
                value: count,
                min: MIN_RINGS,
                max: MAX_RINGS,
            });
        }
        self.ring_count = count;
        Ok(())
    }

    /// Number of radials.
    pub fn radial_count(&self) -> u32 {
        self.radial_count
    }

    /// Sets the number of radials. Must be within `[0, 180]`.
    pub fn set_radial_count(&mut self, count: u32) -> Result<(), SketchError> {
        if count > MAX_RADIALS {
            return Err(SketchError::RadialCountOutOfBounds {
                value: count,
                max: MAX_RADIALS,
            });
        }
        self.radial_count = count;
        Ok(())
    }

    /// Ring spacing for fixed mode, if set.
    pub fn spacing(&self) -> Option<Distance> {
        self.spacing
    }

    /// Sets the ring spacing from a value in the session's distance unit.
    pub fn set_spacing(&mut self, value: f64) -> Result<(), SketchError> {
        self.spacing = Some(Distance::from_value(value, self.config.distance_unit())?);
        Ok(())
    }

    /// Sets the ring spacing from user-entered text.
    pub fn set_spacing_text(&mut self, text: &str) -> Result<(), SketchError> {
        let value = parse_positive(text)?;
        self.set_spacing(value)
    }

    /// Largest ring radius seen so far in interactive mode, in meters.
    pub fn max_observed_distance(&self) -> f64 {
        self.max_observed_m
    }

    fn readout(&self, distance_m: Option<f64>) -> Readout {
        Readout {
            distance: distance_m
                .and_then(|m| Distance::from_meters(m).ok())
                .map(|d| d.in_unit(self.config.distance_unit())),
            distance_unit: Some(self.config.distance_unit()),
            rings: Some(self.ring_count()),
            radials: Some(self.radial_count),
            ..Default::default()
        }
    }

    async fn radial_contours(
        &self,
        center: GeodeticPoint,
        length_m: f64,
    ) -> Result<Vec<Contour<GeodeticPoint>>, SketchError> {
        if self.radial_count == 0 || length_m <= 0.0 {
            return Ok(Vec::new());
        }

        let mut contours = Vec::with_capacity(self.radial_count as usize);
        for azimuth in radial_azimuths(self.radial_count) {
            let end = self
                .geodesy
                .point_from_distance_bearing(center, length_m, azimuth, self.config.method())
                .await?;
            contours.push(Contour::open(vec![center, end]));
        }
        Ok(contours)
    }

    async fn ring_set_preview(&self, center: GeodeticPoint) -> Result<Preview, SketchError> {
        let mut contours = Vec::with_capacity(self.ring_radii_m.len());
        for radius in &self.ring_radii_m {
            contours.push(
                self.geodesy
                    .circle_geometry(center, *radius, self.config.method())
                    .await?,
            );
        }

        Ok(Preview {
            geometry: Geom::MultiContour(contours),
            readout: self.readout(Some(self.max_observed_m)),
        })
    }
}

#[async_trait(?Send)]
impl ShapeBuilder for RangeRingBuilder {
    fn kind(&self) -> ShapeKind {
        ShapeKind::RangeRing
    }

    fn capture_state(&self) -> CaptureState {
        self.sequence.state()
    }

    fn can_commit(&self) -> bool {
        match self.mode {
            RingMode::Fixed => {
                !self.sequence.is_empty()
                    && self.ring_count >= MIN_RINGS
                    && self.spacing.is_some_and(|s| !s.is_zero())
            }
            RingMode::Interactive => !self.sequence.is_empty(),
        }
    }

    async fn add_point(&mut self, point: GeodeticPoint) -> Result<PointOutcome, SketchError> {
        match self.mode {
            RingMode::Fixed => {
                if !self.sequence.is_empty() {
                    return Ok(PointOutcome::Ignored);
                }
                self.sequence.push(point);
                if self.can_commit() {
                    return Ok(PointOutcome::Completed);
                }
                Ok(PointOutcome::Accepted(None))
            }
            RingMode::Interactive => {
                if self.sequence.is_empty() {
                    self.sequence.push(point);
                    return Ok(PointOutcome::Accepted(None));
                }

                let center = self.sequence.points()[0];
                let inverse = self
                    .geodesy
                    .distance_and_bearing(center, point, self.config.method())
                    .await?;
                if inverse.distance_m <= 0.0 {
                    log::debug!("ignoring zero-radius ring point");
                    return Ok(PointOutcome::Ignored);
                }

                self.sequence.push(point);
                self.ring_radii_m.push(inverse.distance_m);
                self.max_observed_m = self.max_observed_m.max(inverse.distance_m);

                let preview = self.ring_set_preview(center).await?;
                Ok(PointOutcome::Accepted(Some(preview)))
            }
        }
    }

    async fn pointer_moved(
        &mut self,
        point: GeodeticPoint,
    ) -> Result<Option<Preview>, SketchError> {
        if self.mode != RingMode::Interactive || self.sequence.is_empty() {
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
        Ok(Some(Preview {
            geometry: Geom::Contour(outline),
            readout: self.readout(Some(inverse.distance_m)),
        }))
    }

    async fn double_click(
        &mut self,
        _point: Option<GeodeticPoint>,
    ) -> Result<PointOutcome, SketchError> {
        if self.mode != RingMode::Interactive || self.sequence.is_empty() {
            return Ok(PointOutcome::Ignored);
        }
        // The double click itself does not add a ring; it only ends the capture.
        Ok(PointOutcome::Completed)
    }

    fn cancel(&mut self) {
        let policy = match self.mode {
            RingMode::Fixed => CapturePolicy::single_point(),
            RingMode::Interactive => CapturePolicy::single_point().open_ended(),
        };
        self.sequence = CaptureSequence::new(policy);
        self.spacing = None;
        self.ring_radii_m.clear();
        self.max_observed_m = 0.0;
    }

    async fn commit(&mut self) -> Result<Vec<ShapeRecord>, SketchError> {
        let center = self
            .sequence
            .first()
            .ok_or(SketchError::IncompleteShape("range ring center is missing"))?;

        let records = match self.mode {
            RingMode::Fixed => {
                let spacing = self
                    .spacing
                    .filter(|s| !s.is_zero())
                    .ok_or(SketchError::IncompleteShape("ring spacing is missing"))?;

                let mut contours = Vec::new();
                for radius in ring_radii(spacing.meters(), self.ring_count) {
                    contours.push(
                        self.geodesy
                            .circle_geometry(center, radius, self.config.method())
                            .await?,
                    );
                }
                let farthest = spacing.meters() * self.ring_count as f64;
                contours.extend(self.radial_contours(center, farthest).await?);

                vec![ShapeRecord::new(
                    self.ids.next_id(),
                    ShapeKind::RangeRing,
                    Geom::MultiContour(contours),
                    HashMap::from([
                        (
                            fields::RINGS.to_string(),
                            AttributeValue::Integer(self.ring_count as i64),
                        ),
                        (
                            fields::DISTANCE.to_string(),
                            AttributeValue::Float(spacing.meters()),
                        ),
                        (
                            fields::RADIALS.to_string(),
                            AttributeValue::Integer(self.radial_count as i64),
                        ),
                    ]),
                )]
            }
            RingMode::Interactive => {
                let mut records = Vec::with_capacity(self.ring_radii_m.len() + 1);
                for (index, radius) in self.ring_radii_m.iter().enumerate() {
                    let outline = self
                        .geodesy
                        .circle_geometry(center, *radius, self.config.method())
                        .await?;
                    records.push(ShapeRecord::new(
                        self.ids.next_id(),
                        ShapeKind::RangeRing,
                        Geom::Contour(outline),
                        HashMap::from([
                            (
                                fields::RING.to_string(),
                                AttributeValue::Integer(index as i64 + 1),
                            ),
                            (
                                fields::DISTANCE.to_string(),
                                AttributeValue::Float(*radius),
                            ),
                        ]),
                    ));
                }

                let radials = self.radial_contours(center, self.max_observed_m).await?;
                if !radials.is_empty() {
                    records.push(ShapeRecord::new(
                        self.ids.next_id(),
                        ShapeKind::RangeRing,
                        Geom::MultiContour(radials),
                        HashMap::from([
                            (
                                fields::RADIALS.to_string(),
                                AttributeValue::Integer(self.radial_count as i64),
                            ),
                            (
                                fields::DISTANCE.to_string(),
                                AttributeValue::Float(self.max_observed_m),
                            ),
                        ]),
                    ));
                }
                records
            }
        };

        self.cancel();
        Ok(records)
    }
}
