use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::sensor::round_to_tenths;
use crate::domain::SimulationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorKind {
    #[strum(to_string = "AC")]
    PrimaryAc,
    #[strum(to_string = "Secondary AC")]
    SecondaryAc,
    Heater,
    Humidifier,
    #[strum(to_string = "Smart Fan")]
    SmartFan,
}

/// Where an actuator gets the value it drives towards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Target {
    /// The live desired-temperature setpoint
    Setpoint,
    Fixed(f64),
}

impl Target {
    fn resolve(self, setpoint: f64) -> f64 {
        match self {
            Target::Setpoint => setpoint,
            Target::Fixed(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Response {
    /// `|current - target| × watts_per_unit`, rounded to 0.1 W and capped.
    /// `heating_only` units draw nothing once `current >= target`.
    Proportional {
        watts_per_unit: f64,
        cap_w: Option<f64>,
        heating_only: bool,
    },
    /// Fixed draw while `current > threshold`.
    Step { threshold: f64, watts: f64 },
}

/// A single parameterised actuator. Stateless: `power` is a pure function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Actuator {
    pub kind: ActuatorKind,
    pub target: Target,
    pub response: Response,
}

impl Actuator {
    pub fn primary_ac() -> Self {
        Self {
            kind: ActuatorKind::PrimaryAc,
            target: Target::Setpoint,
            response: Response::Proportional {
                watts_per_unit: 80.0,
                cap_w: Some(1000.0),
                heating_only: false,
            },
        }
    }

    pub fn secondary_ac() -> Self {
        Self {
            kind: ActuatorKind::SecondaryAc,
            target: Target::Setpoint,
            response: Response::Proportional {
                watts_per_unit: 60.0,
                cap_w: Some(750.0),
                heating_only: false,
            },
        }
    }

    pub fn heater() -> Self {
        Self {
            kind: ActuatorKind::Heater,
            target: Target::Fixed(21.0),
            response: Response::Proportional {
                watts_per_unit: 150.0,
                cap_w: None,
                heating_only: true,
            },
        }
    }

    pub fn humidifier() -> Self {
        Self {
            kind: ActuatorKind::Humidifier,
            target: Target::Fixed(50.0),
            response: Response::Proportional {
                watts_per_unit: 25.0,
                cap_w: Some(300.0),
                heating_only: false,
            },
        }
    }

    pub fn smart_fan() -> Self {
        Self {
            kind: ActuatorKind::SmartFan,
            target: Target::Fixed(26.0),
            response: Response::Step {
                threshold: 26.0,
                watts: 60.0,
            },
        }
    }

    /// Upper bound on this actuator's draw, if any.
    pub fn cap_w(&self) -> Option<f64> {
        match self.response {
            Response::Proportional { cap_w, .. } => cap_w,
            Response::Step { watts, .. } => Some(watts),
        }
    }

    /// Power draw in watts for `current` reading; never negative.
    pub fn power(&self, current: f64, setpoint: f64) -> f64 {
        match self.response {
            Response::Proportional {
                watts_per_unit,
                cap_w,
                heating_only,
            } => {
                let target = self.target.resolve(setpoint);
                if heating_only && current >= target {
                    return 0.0;
                }
                let power = round_to_tenths((current - target).abs() * watts_per_unit);
                match cap_w {
                    Some(cap) => power.min(cap),
                    None => power,
                }
            }
            Response::Step { threshold, watts } => {
                if current > threshold {
                    watts
                } else {
                    0.0
                }
            }
        }
    }
}

/// Secondary AC only helps once the room holds more than this many people.
pub const SECONDARY_AC_MIN_OCCUPANCY: u32 = 10;
/// Fan runs only with at least this many people.
pub const FAN_MIN_OCCUPANCY: u32 = 6;
/// Watts of heater output that raise the room by one degree within a tick.
pub const HEATER_WATTS_PER_DEGREE: f64 = 600.0;

/// Environmental reading handed to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomReading {
    pub occupancy: u32,
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

/// The five actuators of the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorBank {
    pub primary_ac: Actuator,
    pub secondary_ac: Actuator,
    pub heater: Actuator,
    pub humidifier: Actuator,
    pub fan: Actuator,
}

impl Default for ActuatorBank {
    fn default() -> Self {
        Self {
            primary_ac: Actuator::primary_ac(),
            secondary_ac: Actuator::secondary_ac(),
            heater: Actuator::heater(),
            humidifier: Actuator::humidifier(),
            fan: Actuator::smart_fan(),
        }
    }
}

impl ActuatorBank {
    /// Decide which actuators engage for `reading` and compute their draw.
    ///
    /// Heating and cooling are gated on the sign of `temperature - setpoint`
    /// and never run in the same tick. Heater output is fed back into the
    /// returned temperature.
    pub fn dispatch(&self, reading: RoomReading, setpoint: f64) -> SimulationResult {
        let RoomReading {
            occupancy,
            mut temperature_c,
            humidity_pct,
        } = reading;

        let temp_diff = temperature_c - setpoint;
        let (primary_ac_w, secondary_ac_w, heater_w) = if temp_diff > 0.0 {
            let primary = if occupancy == 0 {
                0.0
            } else {
                self.primary_ac.power(temperature_c, setpoint)
            };
            let secondary = if occupancy > SECONDARY_AC_MIN_OCCUPANCY {
                self.secondary_ac.power(temperature_c, setpoint)
            } else {
                0.0
            };
            (primary, secondary, 0.0)
        } else {
            (0.0, 0.0, self.heater.power(temperature_c, setpoint))
        };

        let humidifier_w = self.humidifier.power(humidity_pct, setpoint);
        let fan_w = if occupancy >= FAN_MIN_OCCUPANCY {
            self.fan.power(temperature_c, setpoint)
        } else {
            0.0
        };

        temperature_c += heater_w / HEATER_WATTS_PER_DEGREE;
        let total_power_w = primary_ac_w + secondary_ac_w + humidifier_w + fan_w + heater_w;

        SimulationResult {
            occupancy,
            temperature_c,
            humidity_pct,
            primary_ac_w,
            secondary_ac_w,
            humidifier_w,
            fan_w,
            heater_w,
            total_power_w,
        }
    }
}
