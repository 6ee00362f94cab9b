use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use super::month::{baseline_for, Baseline};

#[derive(Debug, Error)]
pub enum ControlsError {
    #[error("invalid control settings: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// Operator-facing knobs the engine reads at the start of every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ControlSettings {
    #[validate(range(min = 16.0, max = 30.0))]
    pub desired_temp_c: f64,
    pub window_open: bool,
    #[validate(range(min = 1))]
    pub tick_interval_ms: u64,
    pub month: String,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            desired_temp_c: 21.0,
            window_open: false,
            tick_interval_ms: 3000,
            month: "January".to_string(),
        }
    }
}

impl ControlSettings {
    pub fn baseline(&self) -> Baseline {
        baseline_for(&self.month)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn tick_seconds(&self) -> f64 {
        self.tick_interval().as_secs_f64()
    }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ControlsUpdate {
    #[validate(range(min = 16.0, max = 30.0))]
    pub desired_temp_c: Option<f64>,
    pub window_open: Option<bool>,
    #[validate(range(min = 1))]
    pub tick_interval_ms: Option<u64>,
    pub month: Option<String>,
}

impl ControlsUpdate {
    fn apply_to(self, settings: &mut ControlSettings) {
        if let Some(t) = self.desired_temp_c {
            settings.desired_temp_c = t;
        }
        if let Some(open) = self.window_open {
            settings.window_open = open;
        }
        if let Some(ms) = self.tick_interval_ms {
            settings.tick_interval_ms = ms;
        }
        if let Some(month) = self.month {
            settings.month = month;
        }
    }
}

/// Control surface owned by the presentation layer.
///
/// Writers swap in a whole validated [`ControlSettings`]; the engine only ever
/// sees a cloned snapshot, so no lock is held across a tick.
#[derive(Debug)]
pub struct SharedControls {
    inner: RwLock<ControlSettings>,
}

impl SharedControls {
    pub fn new(settings: ControlSettings) -> Result<Self, ControlsError> {
        settings.validate()?;
        Ok(Self {
            inner: RwLock::new(settings),
        })
    }

    pub fn snapshot(&self) -> ControlSettings {
        self.inner.read().clone()
    }

    pub fn update(&self, update: ControlsUpdate) -> Result<ControlSettings, ControlsError> {
        update.validate()?;
        let mut guard = self.inner.write();
        let mut next = guard.clone();
        update.apply_to(&mut next);
        next.validate()?;
        *guard = next.clone();
        Ok(next)
    }
}
