//! Operating limits of the manipulated variables

use serde::{Deserialize, Serialize};

use crate::error::{CstrResult, SimulationError};
use crate::physics::ControlAction;

/// Clamp ranges for `Tc` \[K\] and `Fin` \[m³/min\]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlLimits {
    pub tc_min: f64,
    pub tc_max: f64,
    pub fin_min: f64,
    pub fin_max: f64,
}

impl Default for ControlLimits {
    fn default() -> Self {
        Self {
            tc_min: 290.0,
            tc_max: 450.0,
            fin_min: 95.0,
            fin_max: 105.0,
        }
    }
}

impl ControlLimits {
    pub fn validate(&self) -> CstrResult<()> {
        let ordered = |lo: f64, hi: f64| lo.is_finite() && hi.is_finite() && lo <= hi;
        if !ordered(self.tc_min, self.tc_max) {
            return Err(SimulationError::configuration(format!(
                "Coolant limits must satisfy min <= max, got [{}, {}]",
                self.tc_min, self.tc_max
            )));
        }
        if !ordered(self.fin_min, self.fin_max) {
            return Err(SimulationError::configuration(format!(
                "Inlet flow limits must satisfy min <= max, got [{}, {}]",
                self.fin_min, self.fin_max
            )));
        }
        Ok(())
    }

    pub fn clamp_tc(&self, tc: f64) -> f64 {
        tc.clamp(self.tc_min, self.tc_max)
    }

    pub fn clamp_fin(&self, fin: f64) -> f64 {
        fin.clamp(self.fin_min, self.fin_max)
    }

    /// Clamp both channels
    pub fn clamp(&self, control: &ControlAction) -> ControlAction {
        ControlAction::new(self.clamp_tc(control.tc()), self.clamp_fin(control.fin()))
    }

    pub fn contains(&self, control: &ControlAction) -> bool {
        (self.tc_min..=self.tc_max).contains(&control.tc())
            && (self.fin_min..=self.fin_max).contains(&control.fin())
    }
}
