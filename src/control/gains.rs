//! PID gains and the normalized action mapping
//!
//! An agent acts in a normalized 6-dimensional box `[-1, 1]⁶`. Each
//! component is mapped linearly onto a physical gain range:
//!
//! ```text
//! gain_i = ((a_i + 1) / 2) · (upper_i − lower_i) + lower_i
//! ```
//!
//! | index | gain   | lower | upper |
//! |-------|--------|-------|-------|
//! | 0     | Kp_Cb  | −5    | 25    |
//! | 1     | Ki_Cb  | 0     | 20    |
//! | 2     | Kd_Cb  | 0.02  | 10    |
//! | 3     | Kp_V   | 0     | 1     |
//! | 4     | Ki_V   | 0     | 2     |
//! | 5     | Kd_V   | 0.01  | 1     |

use serde::{Deserialize, Serialize};

use crate::error::{CstrResult, SimulationError};

/// Dimension of the normalized action vector
pub const ACTION_DIM: usize = 6;

// =================================================================================================
// Gains
// =================================================================================================

/// `(Kp, Ki, Kd)` of one loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// Gains of both loops: Cb → Tc and V → Fin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub cb: LoopGains,
    pub v: LoopGains,
}

impl PidGains {
    /// Build from `[Kp_Cb, Ki_Cb, Kd_Cb, Kp_V, Ki_V, Kd_V]`
    pub fn from_array(values: [f64; ACTION_DIM]) -> Self {
        Self {
            cb: LoopGains {
                kp: values[0],
                ki: values[1],
                kd: values[2],
            },
            v: LoopGains {
                kp: values[3],
                ki: values[4],
                kd: values[5],
            },
        }
    }

    /// `[Kp_Cb, Ki_Cb, Kd_Cb, Kp_V, Ki_V, Kd_V]`
    pub fn to_array(&self) -> [f64; ACTION_DIM] {
        [
            self.cb.kp, self.cb.ki, self.cb.kd, self.v.kp, self.v.ki, self.v.kd,
        ]
    }
}

// =================================================================================================
// Scaling table
// =================================================================================================

/// Linear map from the normalized action box to physical gains
///
/// # Example
///
/// ```rust
/// use cstr_rs::control::GainScaling;
///
/// let scaling = GainScaling::default();
///
/// // The lower corner of the box maps onto the lower bounds
/// let gains = scaling.scale(&[-1.0; 6]).unwrap();
/// assert_eq!(gains.to_array(), [-5.0, 0.0, 0.02, 0.0, 0.0, 0.01]);
///
/// // Out-of-range components are rejected
/// assert!(scaling.scale(&[1.5, 0.0, 0.0, 0.0, 0.0, 0.0]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainScaling {
    pub lower: [f64; ACTION_DIM],
    pub upper: [f64; ACTION_DIM],
}

impl Default for GainScaling {
    fn default() -> Self {
        Self {
            lower: [-5.0, 0.0, 0.02, 0.0, 0.0, 0.01],
            upper: [25.0, 20.0, 10.0, 1.0, 2.0, 1.0],
        }
    }
}

impl GainScaling {
    /// Check that every range is finite and non-degenerate
    pub fn validate(&self) -> CstrResult<()> {
        for (i, (lo, hi)) in self.lower.iter().zip(self.upper.iter()).enumerate() {
            if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
                return Err(SimulationError::configuration(format!(
                    "Gain range {} must satisfy lower < upper, got [{}, {}]",
                    i, lo, hi
                )));
            }
        }
        Ok(())
    }

    /// Check an action vector without scaling it
    ///
    /// Length must be 6, every component finite and within `[-1, 1]`.
    pub fn check_action(action: &[f64]) -> CstrResult<[f64; ACTION_DIM]> {
        let values: [f64; ACTION_DIM] = action.try_into().map_err(|_| {
            SimulationError::configuration(format!(
                "Action must have {} components, got {}",
                ACTION_DIM,
                action.len()
            ))
        })?;

        if let Some((i, a)) = values
            .iter()
            .enumerate()
            .find(|(_, a)| !(a.is_finite() && (-1.0..=1.0).contains(*a)))
        {
            return Err(SimulationError::configuration(format!(
                "Action component {} must lie in [-1, 1], got {}",
                i, a
            )));
        }

        Ok(values)
    }

    /// Map a normalized action onto physical gains
    pub fn scale(&self, action: &[f64]) -> CstrResult<PidGains> {
        let values = Self::check_action(action)?;

        let mut gains = [0.0; ACTION_DIM];
        for (((gain, a), lo), hi) in gains
            .iter_mut()
            .zip(values.iter())
            .zip(self.lower.iter())
            .zip(self.upper.iter())
        {
            *gain = ((a + 1.0) / 2.0) * (hi - lo) + lo;
        }

        Ok(PidGains::from_array(gains))
    }

    /// Inverse of [`GainScaling::scale`]
    ///
    /// Gains outside the table yield components outside `[-1, 1]`; no
    /// clamping is applied.
    pub fn normalize(&self, gains: &PidGains) -> [f64; ACTION_DIM] {
        let physical = gains.to_array();
        let mut action = [0.0; ACTION_DIM];
        for (((a, gain), lo), hi) in action
            .iter_mut()
            .zip(physical.iter())
            .zip(self.lower.iter())
            .zip(self.upper.iter())
        {
            *a = 2.0 * (gain - lo) / (hi - lo) - 1.0;
        }
        action
    }
}

// =================================================================================================
// Tests
// =================================================================================================
