use serde::{Deserialize, Serialize};
use strum::Display;

/// Immutable outcome of one simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// People in the room this tick
    pub occupancy: u32,
    /// Room temperature after heating feedback (°C)
    pub temperature_c: f64,
    /// Relative humidity (%)
    pub humidity_pct: f64,
    pub primary_ac_w: f64,
    pub secondary_ac_w: f64,
    pub humidifier_w: f64,
    pub fan_w: f64,
    pub heater_w: f64,
    /// Sum of all actuator draws (W)
    pub total_power_w: f64,
}

impl SimulationResult {
    pub fn cooling_w(&self) -> f64 {
        self.primary_ac_w + self.secondary_ac_w
    }

    pub fn total_power_kw(&self) -> f64 {
        self.total_power_w / 1000.0
    }
}

/// One-line operator hint derived from a tick; at most one is shown at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    #[strum(to_string = "🔥 ALERT: Room is overheating!")]
    Overheating,
    #[strum(to_string = "⚠️ No one is in the room. AC is off.")]
    RoomEmpty,
    #[strum(to_string = "💡 Tip: Reduce room temp by 1°C to save ~7% energy.")]
    EnergyTip,
}

const ENERGY_TIP_THRESHOLD_W: f64 = 2500.0;

impl Advisory {
    /// First match wins: overheating, then empty room, then high draw.
    pub fn evaluate(result: &SimulationResult, desired_temp_c: f64) -> Option<Self> {
        if result.temperature_c > desired_temp_c {
            Some(Advisory::Overheating)
        } else if result.occupancy == 0 {
            Some(Advisory::RoomEmpty)
        } else if result.total_power_w > ENERGY_TIP_THRESHOLD_W {
            Some(Advisory::EnergyTip)
        } else {
            None
        }
    }
}
