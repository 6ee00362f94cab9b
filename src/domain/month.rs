use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Indoor starting conditions for a simulated month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

impl Baseline {
    pub const fn new(temperature_c: f64, humidity_pct: f64) -> Self {
        Self {
            temperature_c,
            humidity_pct,
        }
    }
}

impl Default for Baseline {
    fn default() -> Self {
        Self::new(22.0, 50.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub fn baseline(self) -> Baseline {
        match self {
            Month::January => Baseline::new(14.0, 65.0),
            Month::February => Baseline::new(17.0, 60.0),
            Month::March => Baseline::new(22.0, 50.0),
            Month::April => Baseline::new(28.0, 35.0),
            Month::May => Baseline::new(33.0, 38.0),
            Month::June => Baseline::new(34.0, 58.0),
            Month::July => Baseline::new(31.0, 75.0),
            Month::August => Baseline::new(30.0, 80.0),
            Month::September => Baseline::new(29.0, 75.0),
            Month::October => Baseline::new(26.0, 60.0),
            Month::November => Baseline::new(20.0, 55.0),
            Month::December => Baseline::new(15.0, 65.0),
        }
    }

    /// All twelve months paired with their baseline, in calendar order.
    pub fn table() -> Vec<(Month, Baseline)> {
        Month::iter().map(|m| (m, m.baseline())).collect()
    }
}

/// Case-insensitive lookup; unrecognised keys fall back to [`Baseline::default`].
pub fn baseline_for(key: &str) -> Baseline {
    key.trim()
        .parse::<Month>()
        .map(Month::baseline)
        .unwrap_or_default()
}
