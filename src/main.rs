use anyhow::Result;
use axum::Router;
use config::Config;
use room_thermostat_sim::{api, config, controller, telemetry};
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;
    let _log_guard = init_tracing(&cfg.telemetry);

    if cfg.auth.token.is_empty() {
        anyhow::bail!(
            "THERMO__AUTH__TOKEN must be set to a random token. \
            Generate one with: openssl rand -base64 32"
        );
    }

    if cfg.auth.token == "devtoken" {
        warn!("Using 'devtoken' auth token - this is only safe for local development!");
    }

    let app_state = controller::AppState::new(cfg.clone())?;

    #[allow(unused_mut)]
    let mut app: Router = api::router(app_state.clone(), &cfg);

    #[cfg(feature = "metrics")]
    {
        app = api::with_metrics(app, &cfg);
    }

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!("Server binding to 0.0.0.0 - the control API will be reachable from the network");
    }

    info!(
        %addr,
        month = %cfg.simulation.month,
        tick_interval_ms = cfg.simulation.tick_interval_ms,
        "starting room thermostat simulator"
    );

    controller::spawn_controller_tasks(&app_state).await;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    app_state.runner.stop().await;
    warn!("shutdown complete");
    Ok(())
}
