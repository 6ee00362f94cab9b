use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use super::error::ApiError;
use super::response::{success, ApiResponse};
use crate::{
    auth::{require_bearer, BearerToken},
    config::Config,
    controller::{AppState, RunnerStatus},
    domain::{Advisory, Baseline, ControlSettings, ControlsUpdate, Month},
    presenter::{LiveValues, SeriesPoint, TickReport},
};

pub fn router(state: AppState, cfg: &Config) -> Router {
    let token = BearerToken::new(cfg.auth.token.clone());
    let protected = Router::new()
        .route("/status", get(get_status))
        .route("/series", get(get_series))
        .route("/controls", get(get_controls).put(update_controls))
        .route("/months", get(list_months))
        .route("/simulation/start", post(start_simulation))
        .route("/simulation/stop", post(stop_simulation))
        .route("/simulation/reset", post(reset_simulation))
        .route("/simulation/step", post(step_simulation))
        .route_layer(middleware::from_fn_with_state(token, require_bearer));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(protected)
        .with_state(state)
}

pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    #[serde(flatten)]
    pub runner: RunnerStatus,
    pub maintenance_due: bool,
    pub maintenance_message: Option<String>,
    pub live: Option<LiveValues>,
    pub advisory: Option<Advisory>,
    pub advisory_message: Option<String>,
    pub controls: ControlSettings,
}

pub async fn get_status(State(st): State<AppState>) -> ApiResponse<SystemStatus> {
    let runner = st.runner.status().await;
    let view = st.dashboard.view();
    success(SystemStatus {
        runner,
        maintenance_due: view.maintenance_due,
        maintenance_message: view.maintenance_message,
        live: view.live,
        advisory: view.advisory,
        advisory_message: view.advisory_message,
        controls: st.controls.snapshot(),
    })
}

pub async fn get_series(State(st): State<AppState>) -> ApiResponse<Vec<SeriesPoint>> {
    let series = st.dashboard.series();
    let count = series.len();
    success(series).with_count(count, Some(st.dashboard.series_capacity()))
}

pub async fn get_controls(State(st): State<AppState>) -> ApiResponse<ControlSettings> {
    success(st.controls.snapshot())
}

pub async fn update_controls(
    State(st): State<AppState>,
    body: Result<Json<ControlsUpdate>, JsonRejection>,
) -> Result<ApiResponse<ControlSettings>, ApiError> {
    let Json(update) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let settings = st.controls.update(update)?;
    tracing::info!(
        desired_temp_c = settings.desired_temp_c,
        window_open = settings.window_open,
        tick_interval_ms = settings.tick_interval_ms,
        month = %settings.month,
        "controls updated"
    );
    Ok(success(settings))
}

#[derive(Debug, Serialize)]
pub struct MonthBaseline {
    pub month: Month,
    #[serde(flatten)]
    pub baseline: Baseline,
}

pub async fn list_months() -> ApiResponse<Vec<MonthBaseline>> {
    let months: Vec<_> = Month::table()
        .into_iter()
        .map(|(month, baseline)| MonthBaseline { month, baseline })
        .collect();
    let count = months.len();
    success(months).with_count(count, None)
}

#[derive(Debug, Serialize)]
pub struct RunAck {
    pub run_id: Uuid,
}

pub async fn start_simulation(
    State(st): State<AppState>,
) -> Result<ApiResponse<RunAck>, ApiError> {
    let run_id = st.runner.start().await?;
    Ok(success(RunAck { run_id }))
}

pub async fn stop_simulation(State(st): State<AppState>) -> ApiResponse<RunnerStatus> {
    st.runner.stop().await;
    success(st.runner.status().await)
}

pub async fn reset_simulation(
    State(st): State<AppState>,
) -> Result<ApiResponse<RunAck>, ApiError> {
    let run_id = st.runner.reset().await?;
    Ok(success(RunAck { run_id }))
}

pub async fn step_simulation(
    State(st): State<AppState>,
) -> Result<ApiResponse<TickReport>, ApiError> {
    Ok(success(st.runner.step_once().await?))
}
