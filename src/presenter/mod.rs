//! Consumers of tick reports: the append-only log file and the live dashboard.

pub mod dashboard;
pub mod log_file;
pub mod series;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Advisory, SimulationResult};

pub use dashboard::{Dashboard, DashboardView, LiveValues};
pub use log_file::LogFilePresenter;
pub use series::{SeriesPoint, TimeSeries};

const WATT_SECONDS_PER_KWH: f64 = 3_600_000.0;

/// Everything a presenter needs about one tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub run_id: Uuid,
    pub tick: u64,
    pub at: DateTime<Utc>,
    pub result: SimulationResult,
    /// Bill after this tick
    pub total_cost: f64,
    pub runtime_seconds: u64,
    pub tick_seconds: f64,
    /// Setpoint in force during the tick
    pub desired_temp_c: f64,
}

impl TickReport {
    pub fn advisory(&self) -> Option<Advisory> {
        Advisory::evaluate(&self.result, self.desired_temp_c)
    }

    /// Energy of this tick split across the occupants, rounded to 5 decimals.
    pub fn energy_per_person_kwh(&self) -> Option<f64> {
        if self.result.occupancy == 0 {
            return None;
        }
        let tick_kwh = self.result.total_power_w * self.tick_seconds / WATT_SECONDS_PER_KWH;
        let per_person = tick_kwh / self.result.occupancy as f64;
        Some((per_person * 100_000.0 + 0.5).floor() / 100_000.0)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Presenter: Send + Sync {
    fn name(&self) -> &str;

    /// Render or record one tick. Failures are reported, never fatal.
    async fn present(&self, report: &TickReport) -> Result<()>;

    /// Forget everything shown so far (simulation reset).
    async fn clear(&self) -> Result<()>;
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_energy_per_person() {
        let r = report(warm_crowded());
        // 1320 W × 3 s = 0.0011 kWh over 15 people
        assert_eq!(r.energy_per_person_kwh(), Some(0.00007));
    }

    #[test]
    fn test_no_energy_per_person_in_empty_room() {
        let mut result = warm_crowded();
        result.occupancy = 0;
        assert_eq!(report(result).energy_per_person_kwh(), None);
    }

    #[test]
    fn test_report_advisory_uses_tick_setpoint() {
        let mut r = report(warm_crowded());
        assert_eq!(r.advisory(), Some(Advisory::Overheating));
        r.desired_temp_c = 30.0;
        assert_eq!(r.advisory(), None);
    }
}
