use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use super::{Presenter, TickReport};

const RECORD_SEPARATOR: &str = "----------------------------";

/// Appends one human-readable record per tick to a text file.
///
/// The file is created on first write and never rotated.
pub struct LogFilePresenter {
    path: PathBuf,
}

impl LogFilePresenter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format_record(report: &TickReport) -> String {
        let r = &report.result;
        let mut out = String::with_capacity(400);
        // Writing to a String cannot fail.
        let _ = writeln!(out, "People in room: {}", r.occupancy);
        let _ = writeln!(out, "Current Room Temperature: {:?} °C", r.temperature_c);
        let _ = writeln!(out, "AC Power Consumption: {:?} W", r.primary_ac_w);
        let _ = writeln!(out, "Secondary AC Power Consumption: {:?} W", r.secondary_ac_w);
        let _ = writeln!(out, "Current Room Humidity: {:?} %", r.humidity_pct);
        let _ = writeln!(out, "Humidifier Power Consumption: {:?} W", r.humidifier_w);
        let _ = writeln!(out, "Smart Fan Power Consumption: {:?} W", r.fan_w);
        let _ = writeln!(out, "Heater Power Consumption: {:?} W", r.heater_w);
        let _ = writeln!(out, "Total Electricity Cost: ${:?}", report.total_cost);
        let _ = writeln!(out, "{RECORD_SEPARATOR}");
        out
    }
}

#[async_trait]
impl Presenter for LogFilePresenter {
    fn name(&self) -> &str {
        "log_file"
    }

    async fn present(&self, report: &TickReport) -> Result<()> {
        let record = Self::format_record(report);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.write_all(record.as_bytes())
            .await
            .with_context(|| format!("appending to {}", self.path.display()))?;
        file.flush().await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        // The log is a history across runs; a reset leaves it untouched.
        Ok(())
    }
}
