//! Distance, angular and time-rate unit conversions.
//!
//! All conversions go through a canonical unit: meters for distances, degrees for
//! azimuths, using exact pairwise factors. Values that live in a session are stored in
//! the canonical unit as [`Distance`] and [`Azimuth`] and re-expressed on demand, so
//! repeated unit switches never accumulate rounding error.

use serde::{Deserialize, Serialize};

use crate::error::SketchError;

/// Supported distance units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum DistanceUnit {
    /// International feet.
    Feet,
    /// Kilometers.
    Kilometers,
    /// Meters.
    #[default]
    Meters,
    /// Statute miles.
    Miles,
    /// Nautical miles.
    NauticalMiles,
    /// International yards.
    Yards,
}

impl DistanceUnit {
    /// Number of meters in one unit.
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            DistanceUnit::Feet => 0.3048,
            DistanceUnit::Kilometers => 1000.0,
            DistanceUnit::Meters => 1.0,
            DistanceUnit::Miles => 1609.344,
            DistanceUnit::NauticalMiles => 1852.0,
            DistanceUnit::Yards => 0.9144,
        }
    }

    /// Display name of the unit, used in shape record attributes.
    pub fn label(&self) -> &'static str {
        match self {
            DistanceUnit::Feet => "Feet",
            DistanceUnit::Kilometers => "Kilometers",
            DistanceUnit::Meters => "Meters",
            DistanceUnit::Miles => "Miles",
            DistanceUnit::NauticalMiles => "NauticalMiles",
            DistanceUnit::Yards => "Yards",
        }
    }

    /// All supported units, in display order.
    pub const ALL: [DistanceUnit; 6] = [
        DistanceUnit::Feet,
        DistanceUnit::Kilometers,
        DistanceUnit::Meters,
        DistanceUnit::Miles,
        DistanceUnit::NauticalMiles,
        DistanceUnit::Yards,
    ];
}

/// Converts a distance value between units.
pub fn convert_distance(value: f64, from: DistanceUnit, to: DistanceUnit) -> f64 {
    value * from.meters_per_unit() / to.meters_per_unit()
}

/// Supported angular units for azimuth values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum AngularUnit {
    /// Degrees, 360 per full turn.
    #[default]
    Degrees,
    /// Mils, 6400 per full turn.
    Mils,
}

const MILS_PER_DEGREE: f64 = 6400.0 / 360.0;

/// Converts an azimuth value from degrees to mils.
pub fn degrees_to_mils(degrees: f64) -> f64 {
    degrees * MILS_PER_DEGREE
}

/// Converts an azimuth value from mils to degrees.
pub fn mils_to_degrees(mils: f64) -> f64 {
    mils / MILS_PER_DEGREE
}

/// Converts an angular value between units.
pub fn convert_angle(value: f64, from: AngularUnit, to: AngularUnit) -> f64 {
    match (from, to) {
        (AngularUnit::Degrees, AngularUnit::Mils) => degrees_to_mils(value),
        (AngularUnit::Mils, AngularUnit::Degrees) => mils_to_degrees(value),
        _ => value,
    }
}

/// Supported time units for travel-rate calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum TimeUnit {
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    #[default]
    Hours,
}

impl TimeUnit {
    /// Number of seconds in one unit.
    pub fn seconds_per_unit(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
        }
    }
}

/// Converts a time value between units.
pub fn convert_time(value: f64, from: TimeUnit, to: TimeUnit) -> f64 {
    value * from.seconds_per_unit() / to.seconds_per_unit()
}

/// Unit of a travel rate: distance per time, e.g. kilometers per hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct RateUnit {
    /// Distance part of the rate.
    pub distance: DistanceUnit,
    /// Time part of the rate.
    pub time: TimeUnit,
}

impl RateUnit {
    /// Creates a new rate unit.
    pub fn new(distance: DistanceUnit, time: TimeUnit) -> Self {
        Self { distance, time }
    }
}

/// Distance traveled at `rate` (in `rate_unit`) over `time` (in `time_unit`).
///
/// The time value is first converted to the rate's time unit, then multiplied.
pub fn travel_distance(
    rate: f64,
    rate_unit: RateUnit,
    time: f64,
    time_unit: TimeUnit,
) -> Result<Distance, SketchError> {
    let time_in_rate_units = convert_time(time, time_unit, rate_unit.time);
    Distance::from_value(rate * time_in_rate_units, rate_unit.distance)
}

/// A non-negative distance, stored canonically in meters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct Distance(f64);

impl Distance {
    /// Zero distance.
    pub const ZERO: Distance = Distance(0.0);

    /// Creates a distance from a value in meters. Negative values are rejected.
    pub fn from_meters(meters: f64) -> Result<Self, SketchError> {
        if meters < 0.0 || meters.is_nan() {
            return Err(SketchError::NegativeDistance(meters));
        }
        Ok(Self(meters))
    }

    /// Creates a distance from a value in the given unit. Negative values are rejected.
    pub fn from_value(value: f64, unit: DistanceUnit) -> Result<Self, SketchError> {
        Self::from_meters(convert_distance(value, unit, DistanceUnit::Meters))
    }

    /// Value in meters.
    pub fn meters(&self) -> f64 {
        self.0
    }

    /// Value re-expressed in the given unit.
    pub fn in_unit(&self, unit: DistanceUnit) -> f64 {
        convert_distance(self.0, DistanceUnit::Meters, unit)
    }

    /// Whether the distance is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

/// An azimuth from true north, stored canonically in degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct Azimuth(f64);

impl Azimuth {
    /// Creates an azimuth from a value in degrees.
    pub fn from_degrees(degrees: f64) -> Self {
        Self(degrees)
    }

    /// Creates an azimuth from a value in the given angular unit.
    pub fn from_value(value: f64, unit: AngularUnit) -> Self {
        Self(convert_angle(value, unit, AngularUnit::Degrees))
    }

    /// Value in degrees.
    pub fn degrees(&self) -> f64 {
        self.0
    }

    /// Value re-expressed in the given angular unit.
    pub fn in_unit(&self, unit: AngularUnit) -> f64 {
        convert_angle(self.0, AngularUnit::Degrees, unit)
    }
}

/// Converts a raw tangent angle (counterclockwise from east, in degrees) into a
/// north-based clockwise bearing.
pub fn bearing_from_tangent(theta_degrees: f64) -> f64 {
    let bearing = if theta_degrees < 90.0 {
        90.0 - theta_degrees
    } else {
        360.0 - (theta_degrees - 90.0)
    };
    bearing.rem_euclid(360.0)
}

/// Parses user-entered text as a non-negative number.
pub fn parse_positive(text: &str) -> Result<f64, SketchError> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| SketchError::UnparsableNumber(text.to_string()))?;
    if value < 0.0 || !value.is_finite() {
        return Err(SketchError::NegativeDistance(value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn distance_round_trip_all_pairs() {
        for from in DistanceUnit::ALL {
            for to in DistanceUnit::ALL {
                let converted = convert_distance(1234.5678, from, to);
                let back = convert_distance(converted, to, from);
                assert_relative_eq!(back, 1234.5678, max_relative = 1e-6);
            }
        }
    }

    #[test]
    fn known_distance_factors() {
        assert_relative_eq!(
            convert_distance(1.0, DistanceUnit::Miles, DistanceUnit::Meters),
            1609.344
        );
        assert_relative_eq!(
            convert_distance(1.0, DistanceUnit::NauticalMiles, DistanceUnit::Meters),
            1852.0
        );
        assert_relative_eq!(
            convert_distance(3.0, DistanceUnit::Feet, DistanceUnit::Meters),
            0.9144
        );
        assert_relative_eq!(
            convert_distance(1.0, DistanceUnit::Yards, DistanceUnit::Feet),
            3.0
        );
    }

    #[test]
    fn azimuth_round_trip() {
        assert_relative_eq!(degrees_to_mils(90.0), 1600.0);
        assert_relative_eq!(mils_to_degrees(1600.0), 90.0);
        assert_relative_eq!(degrees_to_mils(mils_to_degrees(1234.5)), 1234.5);
        assert_relative_eq!(mils_to_degrees(1.0), 0.05625);
    }

    #[test]
    fn bearing_normalization_boundaries() {
        assert_relative_eq!(bearing_from_tangent(0.0), 90.0);
        assert_relative_eq!(bearing_from_tangent(90.0), 0.0);
        assert_relative_eq!(bearing_from_tangent(180.0), 270.0);
        assert_relative_eq!(bearing_from_tangent(270.0), 180.0);
    }

    #[test]
    fn travel_distance_normalizes_time() {
        // 50 km/h for 2 hours
        let rate_unit = RateUnit::new(DistanceUnit::Kilometers, TimeUnit::Hours);
        let d = travel_distance(50.0, rate_unit, 2.0, TimeUnit::Hours).expect("valid distance");
        assert_relative_eq!(d.meters(), 100_000.0);

        // 50 km/h for 30 minutes
        let d = travel_distance(50.0, rate_unit, 30.0, TimeUnit::Minutes).expect("valid distance");
        assert_relative_eq!(d.meters(), 25_000.0);

        // 10 m/s for 1 minute
        let rate_unit = RateUnit::new(DistanceUnit::Meters, TimeUnit::Seconds);
        let d = travel_distance(10.0, rate_unit, 1.0, TimeUnit::Minutes).expect("valid distance");
        assert_relative_eq!(d.meters(), 600.0);
    }

    #[test]
    fn negative_distance_is_rejected() {
        assert_matches!(
            Distance::from_meters(-1.0),
            Err(SketchError::NegativeDistance(_))
        );
        assert_matches!(
            Distance::from_value(-0.5, DistanceUnit::Kilometers),
            Err(SketchError::NegativeDistance(_))
        );
    }

    #[test]
    fn azimuth_is_not_accumulated_across_unit_changes() {
        let azimuth = Azimuth::from_value(1600.0, AngularUnit::Mils);
        assert_relative_eq!(azimuth.degrees(), 90.0);
        // The stored value is canonical, so re-expressing it any number of times
        // always starts from the same degrees and cannot drift.
        for _ in 0..100 {
            assert_relative_eq!(azimuth.in_unit(AngularUnit::Mils), 1600.0);
            assert_relative_eq!(azimuth.in_unit(AngularUnit::Degrees), 90.0);
        }
    }

    #[test]
    fn parse_positive_rejects_garbage() {
        assert_relative_eq!(parse_positive(" 100 ").expect("parsable"), 100.0);
        assert_matches!(
            parse_positive("12,5"),
            Err(SketchError::UnparsableNumber(_))
        );
        assert_matches!(parse_positive(""), Err(SketchError::UnparsableNumber(_)));
        assert_matches!(parse_positive("-3"), Err(SketchError::NegativeDistance(_)));
    }
}
