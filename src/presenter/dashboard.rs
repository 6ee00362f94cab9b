use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use super::series::{SeriesPoint, TimeSeries};
use super::{Presenter, TickReport};
use crate::domain::Advisory;

/// Values shown on the dashboard's live panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveValues {
    pub occupancy: u32,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub total_power_kw: f64,
    pub primary_ac_kw: f64,
    pub secondary_ac_w: f64,
    pub heater_w: f64,
    pub fan_w: f64,
    pub humidifier_w: f64,
    pub bill: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_per_person_kwh: Option<f64>,
}

impl From<&TickReport> for LiveValues {
    fn from(report: &TickReport) -> Self {
        let r = &report.result;
        Self {
            occupancy: r.occupancy,
            temperature_c: r.temperature_c,
            humidity_pct: r.humidity_pct,
            total_power_kw: r.total_power_kw(),
            primary_ac_kw: r.primary_ac_w / 1000.0,
            secondary_ac_w: r.secondary_ac_w,
            heater_w: r.heater_w,
            fan_w: r.fan_w,
            humidifier_w: r.humidifier_w,
            bill: report.total_cost,
            energy_per_person_kwh: report.energy_per_person_kwh(),
        }
    }
}

/// Point-in-time copy of the dashboard for the API.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub run_id: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
    pub live: Option<LiveValues>,
    pub advisory: Option<Advisory>,
    pub advisory_message: Option<String>,
    pub maintenance_due: bool,
    pub maintenance_message: Option<String>,
    pub series_len: usize,
    pub latest_point: Option<SeriesPoint>,
}

struct Inner {
    run_id: Option<Uuid>,
    updated_at: Option<DateTime<Utc>>,
    live: Option<LiveValues>,
    advisory: Option<Advisory>,
    maintenance_due: bool,
    series: TimeSeries,
}

impl Inner {
    fn empty(series_capacity: usize) -> Self {
        Self {
            run_id: None,
            updated_at: None,
            live: None,
            advisory: None,
            maintenance_due: false,
            series: TimeSeries::new(series_capacity),
        }
    }

    fn clear(&mut self) {
        self.run_id = None;
        self.updated_at = None;
        self.live = None;
        self.advisory = None;
        self.maintenance_due = false;
        self.series.clear();
    }
}

/// In-memory live panel and graph buffer.
pub struct Dashboard {
    inner: RwLock<Inner>,
    maintenance_after_hours: u64,
}

impl Dashboard {
    pub fn new(series_capacity: usize, maintenance_after_hours: u64) -> Self {
        Self {
            inner: RwLock::new(Inner::empty(series_capacity)),
            maintenance_after_hours,
        }
    }

    fn maintenance_threshold_s(&self) -> u64 {
        self.maintenance_after_hours.saturating_mul(3600)
    }

    fn maintenance_message(&self) -> String {
        format!(
            "🛠️ Maintenance Alert: AC runtime exceeded {} hours.",
            self.maintenance_after_hours
        )
    }

    pub fn view(&self) -> DashboardView {
        let inner = self.inner.read();
        DashboardView {
            run_id: inner.run_id,
            updated_at: inner.updated_at,
            live: inner.live.clone(),
            advisory: inner.advisory,
            advisory_message: inner.advisory.map(|a| a.to_string()),
            maintenance_due: inner.maintenance_due,
            maintenance_message: inner.maintenance_due.then(|| self.maintenance_message()),
            series_len: inner.series.len(),
            latest_point: inner.series.latest().copied(),
        }
    }

    /// Maximum number of points kept for the graph.
    pub fn series_capacity(&self) -> usize {
        self.inner.read().series.capacity()
    }

    pub fn series(&self) -> Vec<SeriesPoint> {
        self.inner.read().series.to_vec()
    }

    pub fn reset(&self) {
        self.inner.write().clear();
    }

    fn record(&self, report: &TickReport) {
        let mut inner = self.inner.write();

        if inner.run_id != Some(report.run_id) {
            inner.maintenance_due = false;
        }
        inner.run_id = Some(report.run_id);
        inner.updated_at = Some(report.at);
        inner.live = Some(LiveValues::from(report));
        inner.advisory = report.advisory();
        inner.series.push(SeriesPoint {
            time_s: report.runtime_seconds,
            temperature_c: report.result.temperature_c,
            humidity_pct: report.result.humidity_pct,
            power_kw: report.result.total_power_kw(),
        });

        if !inner.maintenance_due && report.runtime_seconds > self.maintenance_threshold_s() {
            inner.maintenance_due = true;
            warn!(
                run_id = %report.run_id,
                runtime_seconds = report.runtime_seconds,
                "{}",
                self.maintenance_message()
            );
        }
    }
}

#[async_trait]
impl Presenter for Dashboard {
    fn name(&self) -> &str {
        "dashboard"
    }

    async fn present(&self, report: &TickReport) -> Result<()> {
        self.record(report);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.reset();
        Ok(())
    }
}
