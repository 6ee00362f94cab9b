use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use validator::Validate;

use crate::domain::ControlSettings;
use crate::simulation::{BaselineAnchoring, EngineConfig, TemperatureRounding};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[validate(nested)]
    pub simulation: SimulationConfig,
    #[validate(nested)]
    pub billing: BillingConfig,
    #[validate(nested)]
    pub dashboard: DashboardConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub request_timeout_secs: u64,
}
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            enable_cors: false,
            request_timeout_secs: 10,
        }
    }
}
impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimulationConfig {
    #[validate(range(min = 1))]
    pub tick_interval_ms: u64,
    #[validate(range(min = 16.0, max = 30.0))]
    pub desired_temp_c: f64,
    pub window_open: bool,
    pub month: String,
    pub random_seed: Option<u64>,
    pub autostart: bool,
    pub temperature_rounding: TemperatureRounding,
    pub baseline_anchoring: BaselineAnchoring,
}
impl Default for SimulationConfig {
    fn default() -> Self {
        let controls = ControlSettings::default();
        Self {
            tick_interval_ms: controls.tick_interval_ms,
            desired_temp_c: controls.desired_temp_c,
            window_open: controls.window_open,
            month: controls.month,
            random_seed: None,
            autostart: true,
            temperature_rounding: TemperatureRounding::default(),
            baseline_anchoring: BaselineAnchoring::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BillingConfig {
    #[validate(range(min = 0.0))]
    pub cost_per_kwh: f64,
}
impl Default for BillingConfig {
    fn default() -> Self {
        Self { cost_per_kwh: 8.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DashboardConfig {
    #[validate(range(min = 1))]
    pub series_capacity: usize,
    #[validate(range(min = 1, max = 100_000))]
    pub maintenance_after_hours: u64,
    pub log_enabled: bool,
    pub log_path: String,
}
impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            series_capacity: 1200,
            maintenance_after_hours: 24,
            log_enabled: true,
            log_path: "thermostat_log.txt".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub json: bool,
    /// Directory for a daily-rolling diagnostic log; stdout only when unset
    pub log_dir: Option<String>,
}
impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json: true,
            log_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("THERMO__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Initial control surface values.
    pub fn controls(&self) -> ControlSettings {
        ControlSettings {
            desired_temp_c: self.simulation.desired_temp_c,
            window_open: self.simulation.window_open,
            tick_interval_ms: self.simulation.tick_interval_ms,
            month: self.simulation.month.clone(),
        }
    }

    /// Engine template; the runner fills in the baseline at each (re)start.
    pub fn engine(&self) -> EngineConfig {
        let mut engine = EngineConfig::default()
            .with_temperature_rounding(self.simulation.temperature_rounding)
            .with_anchoring(self.simulation.baseline_anchoring);
        engine.cost_per_kwh = self.billing.cost_per_kwh;
        engine.random_seed = self.simulation.random_seed;
        engine
    }
}
