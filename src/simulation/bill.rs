use serde::{Deserialize, Serialize};

use super::SimulationError;

const WATT_SECONDS_PER_KWH: f64 = 3_600_000.0;
pub const DEFAULT_COST_PER_KWH: f64 = 8.0;

/// Electricity meter accumulating energy in watt-seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillMeter {
    total_watt_seconds: f64,
    cost_per_kwh: f64,
}

impl Default for BillMeter {
    fn default() -> Self {
        Self::new(DEFAULT_COST_PER_KWH)
    }
}

impl BillMeter {
    pub fn new(cost_per_kwh: f64) -> Self {
        Self {
            total_watt_seconds: 0.0,
            cost_per_kwh,
        }
    }

    /// Add `power_w × duration_s` of consumption.
    pub fn accumulate(&mut self, power_w: f64, duration_s: f64) -> Result<(), SimulationError> {
        if !power_w.is_finite() || power_w < 0.0 {
            return Err(SimulationError::InvalidPower(power_w));
        }
        if !duration_s.is_finite() || duration_s < 0.0 {
            return Err(SimulationError::InvalidDuration(duration_s));
        }
        self.total_watt_seconds += power_w * duration_s;
        Ok(())
    }

    pub fn total_watt_seconds(&self) -> f64 {
        self.total_watt_seconds
    }

    pub fn total_kwh(&self) -> f64 {
        self.total_watt_seconds / WATT_SECONDS_PER_KWH
    }

    pub fn cost_per_kwh(&self) -> f64 {
        self.cost_per_kwh
    }

    /// Accumulated cost, rounded to two decimals.
    pub fn total_cost(&self) -> f64 {
        (self.total_kwh() * self.cost_per_kwh * 100.0 + 0.5).floor() / 100.0
    }
}
