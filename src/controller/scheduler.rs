use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::SharedControls;
use crate::presenter::{Presenter, TickReport};
use crate::simulation::{EngineConfig, SimulationEngine, SimulationError};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("simulation is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Task status tracking
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub run_count: u64,
    pub success_count: u64,
    pub error_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunnerStatus {
    pub run_id: Uuid,
    pub running: bool,
    pub ticks: u64,
    pub total_cost: f64,
    pub cost_per_kwh: f64,
    pub runtime_seconds: u64,
    pub task: TaskStatus,
}

/// One engine lifetime. A reset replaces the whole session.
struct Session {
    id: Uuid,
    engine: Mutex<SimulationEngine>,
}

impl Session {
    fn new(config: EngineConfig) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            engine: Mutex::new(SimulationEngine::new(config)),
        })
    }
}

struct RunningTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

struct RunSlot {
    session: Arc<Session>,
    task: Option<RunningTask>,
}

impl RunSlot {
    fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .map(|t| !t.handle.is_finished())
            .unwrap_or(false)
    }
}

/// Owns the engine and drives it on the control surface's tick interval.
///
/// The interval is re-read after every tick, so a change takes effect at the
/// next scheduling boundary. Stopping is cooperative: a tick already in
/// progress finishes and is presented.
pub struct SimulationRunner {
    controls: Arc<SharedControls>,
    template: EngineConfig,
    presenters: Vec<Arc<dyn Presenter>>,
    status: RwLock<TaskStatus>,
    slot: Mutex<RunSlot>,
}

impl SimulationRunner {
    pub fn new(
        controls: Arc<SharedControls>,
        template: EngineConfig,
        presenters: Vec<Arc<dyn Presenter>>,
    ) -> Arc<Self> {
        let session = Session::new(Self::engine_config(&template, &controls));
        Arc::new(Self {
            controls,
            template,
            presenters,
            status: RwLock::new(TaskStatus::default()),
            slot: Mutex::new(RunSlot {
                session,
                task: None,
            }),
        })
    }

    fn engine_config(template: &EngineConfig, controls: &SharedControls) -> EngineConfig {
        template
            .clone()
            .with_baseline(controls.snapshot().baseline())
    }

    pub fn controls(&self) -> &Arc<SharedControls> {
        &self.controls
    }

    /// Begin periodic ticking; the first tick happens immediately.
    pub async fn start(self: &Arc<Self>) -> Result<Uuid, RunnerError> {
        let mut slot = self.slot.lock().await;
        if slot.is_running() {
            return Err(RunnerError::AlreadyRunning);
        }
        Ok(self.spawn_loop(&mut slot))
    }

    fn spawn_loop(self: &Arc<Self>, slot: &mut RunSlot) -> Uuid {
        let token = CancellationToken::new();
        let session = slot.session.clone();
        let runner = Arc::clone(self);
        let handle = tokio::spawn({
            let token = token.clone();
            async move { runner.run_loop(session, token).await }
        });
        slot.task = Some(RunningTask { token, handle });

        info!(run_id = %slot.session.id, "simulation started");
        slot.session.id
    }

    /// Cancel scheduling and wait for the loop to exit. Idempotent.
    pub async fn stop(&self) {
        let mut slot = self.slot.lock().await;
        Self::halt(&mut slot).await;
    }

    async fn halt(slot: &mut RunSlot) {
        if let Some(task) = slot.task.take() {
            task.token.cancel();
            if let Err(e) = task.handle.await {
                error!(error = %e, "simulation task ended abnormally");
            }
            info!(run_id = %slot.session.id, "simulation stopped");
        }
    }

    /// Discard the engine, clear presenters and resume scheduling on a fresh one.
    ///
    /// The slot stays locked throughout, so a concurrent start waits for the
    /// fresh loop and presenters are cleared before its first tick.
    pub async fn reset(self: &Arc<Self>) -> Result<Uuid, RunnerError> {
        let mut slot = self.slot.lock().await;
        Self::halt(&mut slot).await;
        slot.session = Session::new(Self::engine_config(&self.template, &self.controls));
        *self.status.write() = TaskStatus::default();
        info!(run_id = %slot.session.id, "simulation reset");

        for presenter in &self.presenters {
            if let Err(e) = presenter.clear().await {
                warn!(presenter = presenter.name(), error = %e, "presenter clear failed");
            }
        }
        Ok(self.spawn_loop(&mut slot))
    }

    /// Run one tick outside the schedule.
    pub async fn step_once(&self) -> Result<TickReport, RunnerError> {
        let session = self.slot.lock().await.session.clone();
        self.tick(&session).await
    }

    pub async fn is_running(&self) -> bool {
        self.slot.lock().await.is_running()
    }

    pub async fn status(&self) -> RunnerStatus {
        let (session, running) = {
            let slot = self.slot.lock().await;
            (slot.session.clone(), slot.is_running())
        };
        let engine = session.engine.lock().await;
        RunnerStatus {
            run_id: session.id,
            running,
            ticks: engine.ticks(),
            total_cost: engine.total_cost(),
            cost_per_kwh: engine.bill().cost_per_kwh(),
            runtime_seconds: engine.total_runtime_seconds(),
            task: self.status.read().clone(),
        }
    }

    async fn run_loop(self: Arc<Self>, session: Arc<Session>, token: CancellationToken) {
        while !token.is_cancelled() {
            if let Err(e) = self.tick(&session).await {
                error!(run_id = %session.id, error = %e, "tick failed, stopping simulation");
                break;
            }

            let interval = self.controls.snapshot().tick_interval();
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    async fn tick(&self, session: &Session) -> Result<TickReport, RunnerError> {
        let controls = self.controls.snapshot();
        let now = Utc::now();
        {
            let mut status = self.status.write();
            status.last_run = Some(now);
            status.run_count += 1;
        }

        let stepped = {
            let mut engine = session.engine.lock().await;
            engine.step(&controls).map(|result| TickReport {
                run_id: session.id,
                tick: engine.ticks(),
                at: now,
                result,
                total_cost: engine.total_cost(),
                runtime_seconds: engine.total_runtime_seconds(),
                tick_seconds: controls.tick_seconds(),
                desired_temp_c: controls.desired_temp_c,
            })
        };

        let report = match stepped {
            Ok(report) => report,
            Err(e) => {
                let mut status = self.status.write();
                status.error_count += 1;
                status.last_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        let mut failures = Vec::new();
        for presenter in &self.presenters {
            if let Err(e) = presenter.present(&report).await {
                warn!(presenter = presenter.name(), tick = report.tick, error = %e, "presenter failed");
                failures.push(format!("{}: {e}", presenter.name()));
            }
        }

        let mut status = self.status.write();
        if failures.is_empty() {
            status.last_success = Some(now);
            status.success_count += 1;
            status.last_error = None;
        } else {
            status.error_count += 1;
            status.last_error = Some(failures.join("; "));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ControlSettings, ControlsUpdate};
    use crate::presenter::{Dashboard, MockPresenter};
    use crate::simulation::OccupancyModel;
    use std::time::Duration;

    fn runner_with(presenters: Vec<Arc<dyn Presenter>>) -> Arc<SimulationRunner> {
        let controls = Arc::new(SharedControls::new(ControlSettings::default()).unwrap());
        let template = EngineConfig::default()
            .with_random_seed(11)
            .with_occupancy(OccupancyModel::Fixed(4));
        SimulationRunner::new(controls, template, presenters)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_interval_and_stop_is_cooperative() {
        let dashboard = Arc::new(Dashboard::new(100, 24));
        let runner = runner_with(vec![dashboard.clone()]);

        runner.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(7000)).await;
        runner.stop().await;

        // ticks at t = 0, 3 and 6 s
        let status = runner.status().await;
        assert!(!status.running);
        assert_eq!(status.ticks, 3);
        assert_eq!(status.runtime_seconds, 9);
        assert_eq!(dashboard.series().len(), 3);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(runner.status().await.ticks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_applies_at_next_boundary() {
        let runner = runner_with(Vec::new());
        runner.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        runner
            .controls()
            .update(ControlsUpdate {
                tick_interval_ms: Some(1000),
                ..Default::default()
            })
            .unwrap();

        // pending 3 s sleep still fires at t = 3, then t = 4 and 5
        tokio::time::sleep(Duration::from_millis(4500)).await;
        runner.stop().await;
        assert_eq!(runner.status().await.ticks, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_running_is_rejected() {
        let runner = runner_with(Vec::new());
        runner.start().await.unwrap();
        assert!(matches!(
            runner.start().await,
            Err(RunnerError::AlreadyRunning)
        ));
        runner.stop().await;
        runner.stop().await;
        assert!(runner.start().await.is_ok());
        runner.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_presenter_failure_does_not_stop_ticks() {
        let mut failing = MockPresenter::new();
        failing.expect_name().return_const("broken".to_string());
        failing
            .expect_present()
            .times(3)
            .returning(|_| Err(anyhow::anyhow!("disk full")));

        let runner = runner_with(vec![Arc::new(failing)]);
        runner.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(7000)).await;
        runner.stop().await;

        let status = runner.status().await;
        assert_eq!(status.ticks, 3);
        assert_eq!(status.task.error_count, 3);
        assert_eq!(status.task.success_count, 0);
        assert!(status.task.last_error.unwrap().contains("disk full"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_engine_and_clears_presenters() {
        let dashboard = Arc::new(Dashboard::new(100, 24));
        let runner = runner_with(vec![dashboard.clone()]);

        let first = runner.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(4000)).await;
        assert_eq!(runner.status().await.ticks, 2);

        let second = runner.reset().await.unwrap();
        assert_ne!(first, second);

        // the fresh run ticks immediately after the reset
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        let status = runner.status().await;
        assert!(status.running);
        assert_eq!(status.run_id, second);
        assert_eq!(status.ticks, 1);
        assert_eq!(status.runtime_seconds, 3);
        assert_eq!(dashboard.series().len(), 1);
        assert_eq!(dashboard.view().run_id, Some(second));

        runner.stop().await;
    }

    #[tokio::test]
    async fn test_step_once_reports_tick() {
        let runner = runner_with(Vec::new());
        let first = runner.step_once().await.unwrap();
        let second = runner.step_once().await.unwrap();

        assert_eq!(first.tick, 1);
        assert_eq!(second.tick, 2);
        assert_eq!(second.runtime_seconds, 6);
        assert_eq!(second.result.occupancy, 4);
        assert_eq!(second.tick_seconds, 3.0);
        assert!(second.total_cost >= first.total_cost);
        assert!(!runner.is_running().await);
    }

    #[tokio::test]
    async fn test_reset_uses_current_month_baseline() {
        let runner = runner_with(Vec::new());
        runner
            .controls()
            .update(ControlsUpdate {
                month: Some("July".into()),
                ..Default::default()
            })
            .unwrap();
        runner.reset().await.unwrap();
        runner.stop().await;

        let slot = runner.slot.lock().await;
        let engine = slot.session.engine.lock().await;
        assert_eq!(engine.config().baseline.temperature_c, 31.0);
        assert_eq!(engine.config().baseline.humidity_pct, 75.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_presenters_before_first_fresh_tick() {
        let mut seq = mockall::Sequence::new();
        let mut presenter = MockPresenter::new();
        presenter.expect_name().return_const("ordered".to_string());
        presenter
            .expect_clear()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        presenter
            .expect_present()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let runner = runner_with(vec![Arc::new(presenter)]);
        runner.reset().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        runner.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_racing_reset_never_fails_the_reset() {
        let runner = runner_with(Vec::new());
        let (reset, start) = tokio::join!(runner.reset(), runner.start());

        let reset_id = reset.unwrap();
        if let Ok(start_id) = start {
            // start won the lock; reset then replaced its run
            assert_ne!(start_id, reset_id);
        }
        let status = runner.status().await;
        assert!(status.running);
        assert_eq!(status.run_id, reset_id);
        runner.stop().await;
    }
}
