//! # Room Simulation Core
//!
//! The stateful model behind the thermostat dashboard.
//!
//! ## Components
//!
//! - **Sensor**: temperature and humidity generators drifting around a month baseline
//! - **Actuator**: primary/secondary AC, heater, humidifier and smart fan power draw
//! - **Bill**: watt-second accumulator converted to a monetary cost
//! - **Engine**: runs one tick and returns a [`SimulationResult`](crate::domain::SimulationResult)
//!
//! ## Usage
//!
//! ```rust
//! use room_thermostat_sim::domain::ControlSettings;
//! use room_thermostat_sim::simulation::{EngineConfig, SimulationEngine};
//!
//! let mut engine = SimulationEngine::new(EngineConfig::default().with_random_seed(42));
//! let controls = ControlSettings::default();
//!
//! let result = engine.step(&controls).unwrap();
//! assert!(result.total_power_w >= 0.0);
//! assert_eq!(engine.total_runtime_seconds(), 3);
//! ```

pub mod actuator;
pub mod bill;
pub mod engine;
pub mod sensor;

use thiserror::Error;

pub use actuator::{Actuator, ActuatorBank, ActuatorKind, Response, RoomReading, Target};
pub use bill::BillMeter;
pub use engine::{BaselineAnchoring, EngineConfig, EngineState, OccupancyModel, SimulationEngine};
pub use sensor::{EnvironmentSensor, SensorKind, TemperatureRounding};

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("tick interval must be positive, got {0} ms")]
    InvalidTickInterval(u64),
    #[error("invalid power reading: {0} W")]
    InvalidPower(f64),
    #[error("invalid duration: {0} s")]
    InvalidDuration(f64),
}
