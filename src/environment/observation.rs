//! Observation vector handed to the agent
//!
//! ```text
//! [Cb_now, T_now, V_now, Cb_prev, T_prev, V_prev, setpoint_Cb, setpoint_V]
//! ```
//!
//! "now" is the delayed, noisy measurement that left the transport buffer
//! this step, "prev" the one from the step before.

use serde::{Deserialize, Serialize};

use crate::physics::ReactorState;

/// Number of observation components
pub const OBSERVATION_DIM: usize = 8;

/// Measured variables and setpoints seen by the agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    values: [f64; OBSERVATION_DIM],
}

impl Observation {
    /// Assemble from the current and previous measurement
    pub fn new(current: &ReactorState, previous: &ReactorState, setpoint_cb: f64, setpoint_v: f64) -> Self {
        Self {
            values: [
                current.cb(),
                current.temperature(),
                current.volume(),
                previous.cb(),
                previous.temperature(),
                previous.volume(),
                setpoint_cb,
                setpoint_v,
            ],
        }
    }

    pub fn cb(&self) -> f64 {
        self.values[0]
    }

    pub fn temperature(&self) -> f64 {
        self.values[1]
    }

    pub fn volume(&self) -> f64 {
        self.values[2]
    }

    pub fn previous_cb(&self) -> f64 {
        self.values[3]
    }

    pub fn previous_temperature(&self) -> f64 {
        self.values[4]
    }

    pub fn previous_volume(&self) -> f64 {
        self.values[5]
    }

    pub fn setpoint_cb(&self) -> f64 {
        self.values[6]
    }

    pub fn setpoint_v(&self) -> f64 {
        self.values[7]
    }

    pub fn as_array(&self) -> &[f64; OBSERVATION_DIM] {
        &self.values
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }
}

/// Declared range of each observation component
///
/// Measurements can leave this box (disturbances, noise); the bounds
/// describe the space, they are not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationBounds {
    pub low: [f64; OBSERVATION_DIM],
    pub high: [f64; OBSERVATION_DIM],
}

impl Default for ObservationBounds {
    fn default() -> Self {
        Self {
            low: [0.0, 300.0, 80.0, 0.0, 300.0, 80.0, 0.0, 80.0],
            high: [1.0, 400.0, 120.0, 1.0, 400.0, 120.0, 1.0, 120.0],
        }
    }
}

impl ObservationBounds {
    pub fn contains(&self, observation: &Observation) -> bool {
        observation
            .as_array()
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .all(|(v, (lo, hi))| lo <= v && v <= hi)
    }
}
