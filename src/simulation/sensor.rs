//! # Environment Sensors
//!
//! Stateful value generators that drift around a settable baseline. Each
//! `sample()` adds uniformly distributed noise to the internal value and
//! returns a rounded reading:
//!
//! - temperature: noise in `[-5, 0)`, reading is `round(value × 5) / 10`
//!   under [`TemperatureRounding::Legacy`]
//! - humidity: noise in `[-15, 15)`, reading rounded to one decimal

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Rounds to the nearest integer; halves go towards positive infinity.
pub(crate) fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub(crate) fn round_to_tenths(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

/// How a temperature reading is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureRounding {
    /// `round(value × 5) / 10`, which also halves the reading.
    #[default]
    Legacy,
    /// Plain rounding to one decimal.
    Tenths,
}

impl TemperatureRounding {
    fn apply(self, value: f64) -> f64 {
        match self {
            TemperatureRounding::Legacy => round_half_up(value * 5.0) / 10.0,
            TemperatureRounding::Tenths => round_to_tenths(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    Temperature(TemperatureRounding),
    Humidity,
}

impl SensorKind {
    fn noise_range(self) -> Range<f64> {
        match self {
            SensorKind::Temperature(_) => -5.0..0.0,
            SensorKind::Humidity => -15.0..15.0,
        }
    }

    fn round(self, value: f64) -> f64 {
        match self {
            SensorKind::Temperature(rounding) => rounding.apply(value),
            SensorKind::Humidity => round_to_tenths(value),
        }
    }
}

pub struct EnvironmentSensor {
    kind: SensorKind,
    current_value: f64,
    rng: StdRng,
}

impl EnvironmentSensor {
    /// Create a sensor starting at `baseline` (None seed = OS entropy)
    pub fn new(kind: SensorKind, baseline: f64, random_seed: Option<u64>) -> Self {
        let rng = match random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            kind,
            current_value: baseline,
            rng,
        }
    }

    pub fn temperature(baseline_c: f64, rounding: TemperatureRounding, seed: Option<u64>) -> Self {
        Self::new(SensorKind::Temperature(rounding), baseline_c, seed)
    }

    pub fn humidity(baseline_pct: f64, seed: Option<u64>) -> Self {
        Self::new(SensorKind::Humidity, baseline_pct, seed)
    }

    /// Unrounded internal state
    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    /// Perturb the internal value and return the rounded reading.
    pub fn sample(&mut self) -> f64 {
        let change = self.rng.gen_range(self.kind.noise_range());
        self.current_value += change;
        self.kind.round(self.current_value)
    }

    /// Overwrite the internal value unconditionally.
    pub fn reset(&mut self, value: f64) {
        self.current_value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2.5, 3.0)]
    #[case(-2.5, -2.0)]
    #[case(-2.6, -3.0)]
    #[case(4.4, 4.0)]
    fn test_round_half_up(#[case] input: f64, #[case] expected: f64) {
        assert_eq!(round_half_up(input), expected);
    }

    #[test]
    fn test_legacy_temperature_rounding_halves_value() {
        assert_eq!(TemperatureRounding::Legacy.apply(20.0), 10.0);
        assert_eq!(TemperatureRounding::Legacy.apply(21.3), 10.7);
        assert_eq!(TemperatureRounding::Tenths.apply(21.34), 21.3);
    }

    #[test]
    fn test_temperature_only_drifts_down() {
        let mut sensor = EnvironmentSensor::temperature(22.0, TemperatureRounding::Tenths, Some(7));
        let mut previous = sensor.current_value();
        for _ in 0..50 {
            sensor.sample();
            assert!(sensor.current_value() < previous);
            assert!(sensor.current_value() >= previous - 5.0);
            previous = sensor.current_value();
        }
    }

    #[test]
    fn test_legacy_reading_range_after_reset() {
        let mut sensor = EnvironmentSensor::temperature(22.0, TemperatureRounding::Legacy, Some(42));
        for _ in 0..200 {
            sensor.reset(22.0);
            let reading = sensor.sample();
            // internal value lies in [17, 22)
            assert!((8.5..=11.0).contains(&reading), "reading {reading}");
        }
    }

    #[test]
    fn test_humidity_noise_is_symmetric_and_bounded() {
        let mut sensor = EnvironmentSensor::humidity(50.0, Some(42));
        let (mut below, mut above) = (0, 0);
        for _ in 0..500 {
            sensor.reset(50.0);
            let reading = sensor.sample();
            assert!((35.0..=65.0).contains(&reading));
            if reading < 50.0 {
                below += 1;
            } else {
                above += 1;
            }
        }
        assert!(below > 100 && above > 100);
    }

    #[test]
    fn test_seeded_sensors_are_reproducible() {
        let mut a = EnvironmentSensor::humidity(50.0, Some(99));
        let mut b = EnvironmentSensor::humidity(50.0, Some(99));
        for _ in 0..10 {
            assert_eq!(a.sample(), b.sample());
        }
    }

    #[test]
    fn test_reset_overwrites_state() {
        let mut sensor = EnvironmentSensor::humidity(50.0, Some(1));
        sensor.sample();
        sensor.reset(80.0);
        assert_eq!(sensor.current_value(), 80.0);
    }
}
