//! Append-only time-series log of an episode
//!
//! Kept apart from the control state: the controller never reads it, the
//! renderer and the CSV exporter only read it.
//!
//! One record is written by `reset` (time 0, initial state, default
//! control) and one per step (true state after integration, control that
//! reached the plant).

use serde::{Deserialize, Serialize};

use crate::environment::Disturbance;
use crate::physics::{ControlAction, ReactorState};

/// One row of the episode log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRecord {
    /// Time \[min\]
    pub time: f64,
    /// True plant state
    pub state: ReactorState,
    /// Control applied to the plant (after actuator delay)
    pub control: ControlAction,
    pub setpoint_cb: f64,
    pub setpoint_v: f64,
    /// Disturbance fired during this step
    pub disturbance: Option<Disturbance>,
}

/// Episode history used for plotting and export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeLog {
    records: Vec<TimeSeriesRecord>,
}

impl EpisodeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn push(&mut self, record: TimeSeriesRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TimeSeriesRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&TimeSeriesRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Extract one column
    ///
    /// ```rust
    /// use cstr_rs::environment::{EpisodeLog, TimeSeriesRecord};
    /// use cstr_rs::physics::{ControlAction, ReactorState};
    ///
    /// let mut log = EpisodeLog::new();
    /// log.push(TimeSeriesRecord {
    ///     time: 0.0,
    ///     state: ReactorState::new(0.8, 0.0, 0.0, 325.0, 100.0),
    ///     control: ControlAction::new(300.0, 100.0),
    ///     setpoint_cb: 0.7,
    ///     setpoint_v: 100.0,
    ///     disturbance: None,
    /// });
    ///
    /// assert_eq!(log.series(|r| r.state.temperature()), vec![325.0]);
    /// ```
    pub fn series(&self, column: impl Fn(&TimeSeriesRecord) -> f64) -> Vec<f64> {
        self.records.iter().map(column).collect()
    }

    pub fn times(&self) -> Vec<f64> {
        self.series(|r| r.time)
    }

    /// Times at which disturbances fired, with their kind
    pub fn disturbances(&self) -> Vec<(f64, Disturbance)> {
        self.records
            .iter()
            .filter_map(|r| r.disturbance.map(|d| (r.time, d)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(time: f64, disturbance: Option<Disturbance>) -> TimeSeriesRecord {
        TimeSeriesRecord {
            time,
            state: ReactorState::new(0.8, 0.1 * time, 0.0, 325.0, 100.0),
            control: ControlAction::new(300.0, 100.0),
            setpoint_cb: 0.7,
            setpoint_v: 100.0,
            disturbance,
        }
    }

    #[test]
    fn test_append_and_columns() {
        let mut log = EpisodeLog::new();
        log.push(record(0.0, None));
        log.push(record(1.0, None));
        log.push(record(2.0, Some(Disturbance::CoolingUpset)));

        assert_eq!(log.len(), 3);
        assert_eq!(log.times(), vec![0.0, 1.0, 2.0]);
        assert_eq!(log.disturbances(), vec![(2.0, Disturbance::CoolingUpset)]);
    }

    #[test]
    fn test_clear() {
        let mut log = EpisodeLog::with_capacity(4);
        log.push(record(0.0, None));
        log.clear();
        assert!(log.is_empty());
        assert!(log.last().is_none());
    }
}
