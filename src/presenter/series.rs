use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One graph sample: simulated time against temperature, humidity and power.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time_s: u64,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub power_kw: f64,
}

/// Append-only ring buffer; the oldest point is dropped once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    points: VecDeque<SeriesPoint>,
    capacity: usize,
}

impl TimeSeries {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, point: SeriesPoint) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.back()
    }

    pub fn to_vec(&self) -> Vec<SeriesPoint> {
        self.points.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
