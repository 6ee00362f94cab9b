pub mod scheduler;

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::domain::SharedControls;
use crate::presenter::{Dashboard, LogFilePresenter, Presenter};

pub use scheduler::{RunnerError, RunnerStatus, SimulationRunner, TaskStatus};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub controls: Arc<SharedControls>,
    pub dashboard: Arc<Dashboard>,
    pub runner: Arc<SimulationRunner>,
}

impl AppState {
    pub fn new(cfg: Config) -> Result<Self> {
        let controls = Arc::new(SharedControls::new(cfg.controls())?);
        let dashboard = Arc::new(Dashboard::new(
            cfg.dashboard.series_capacity,
            cfg.dashboard.maintenance_after_hours,
        ));

        let mut presenters: Vec<Arc<dyn Presenter>> = vec![dashboard.clone()];
        if cfg.dashboard.log_enabled {
            presenters.push(Arc::new(LogFilePresenter::new(&cfg.dashboard.log_path)));
        }

        let runner = SimulationRunner::new(controls.clone(), cfg.engine(), presenters);

        Ok(Self {
            cfg,
            controls,
            dashboard,
            runner,
        })
    }
}

/// Kick off the tick loop if configured to run at boot.
pub async fn spawn_controller_tasks(state: &AppState) {
    if !state.cfg.simulation.autostart {
        info!("autostart disabled; waiting for POST /api/v1/simulation/start");
        return;
    }
    if let Err(e) = state.runner.start().await {
        warn!(error = %e, "simulation autostart failed");
    }
}
