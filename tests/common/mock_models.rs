//! Analytical plant models for solver tests

use cstr_rs::physics::{ControlAction, PhysicalModel, ReactorState};
use cstr_rs::CstrResult;

/// dy/dt = −k·y on every component
///
/// # Analytical Solution
///
/// y(t) = y₀ · exp(−k·t)
pub struct ExponentialDecay {
    pub decay_rate: f64,
}

impl ExponentialDecay {
    pub fn new(decay_rate: f64) -> Self {
        Self { decay_rate }
    }

    pub fn exact(&self, initial: &ReactorState, time: f64) -> ReactorState {
        *initial * (-self.decay_rate * time).exp()
    }
}

impl PhysicalModel for ExponentialDecay {
    fn compute_physics(&self, state: &ReactorState, _control: &ControlAction) -> CstrResult<ReactorState> {
        Ok(*state * (-self.decay_rate))
    }

    fn name(&self) -> &str {
        "Exponential Decay"
    }
}

/// Temperature relaxes towards the coolant temperature, nothing else moves
///
/// # Analytical Solution
///
/// T(t) = Tc + (T₀ − Tc) · exp(−t/τ)
pub struct LinearHeating {
    pub time_constant: f64,
}

impl LinearHeating {
    pub fn new(time_constant: f64) -> Self {
        Self { time_constant }
    }

    pub fn exact_temperature(&self, t0: f64, tc: f64, time: f64) -> f64 {
        tc + (t0 - tc) * (-time / self.time_constant).exp()
    }
}

impl PhysicalModel for LinearHeating {
    fn compute_physics(&self, state: &ReactorState, control: &ControlAction) -> CstrResult<ReactorState> {
        let dtemp = (control.tc() - state.temperature()) / self.time_constant;
        Ok(ReactorState::new(0.0, 0.0, 0.0, dtemp, 0.0))
    }

    fn name(&self) -> &str {
        "Linear Heating"
    }
}
