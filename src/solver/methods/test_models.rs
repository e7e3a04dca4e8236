//! Analytical models shared by the solver tests

use crate::error::CstrResult;
use crate::physics::{ControlAction, PhysicalModel, ReactorState};

/// dy/dt = −k·y on every component, y(t) = y₀·exp(−kt)
pub(crate) struct ExponentialDecay {
    pub decay_rate: f64,
}

impl PhysicalModel for ExponentialDecay {
    fn compute_physics(&self, state: &ReactorState, _control: &ControlAction) -> CstrResult<ReactorState> {
        Ok(*state * (-self.decay_rate))
    }

    fn name(&self) -> &str {
        "Exponential Decay"
    }
}

/// dy/dt = r on every component, y(t) = y₀ + rt
pub(crate) struct ConstantGrowth {
    pub growth_rate: f64,
}

impl PhysicalModel for ConstantGrowth {
    fn compute_physics(&self, state: &ReactorState, _control: &ControlAction) -> CstrResult<ReactorState> {
        Ok(state.map(|_, _| self.growth_rate))
    }

    fn name(&self) -> &str {
        "Constant Growth"
    }
}

/// Ca' = ω·Cb, Cb' = −ω·Ca, other components frozen
pub(crate) struct HarmonicOscillator {
    pub omega: f64,
}

impl PhysicalModel for HarmonicOscillator {
    fn compute_physics(&self, state: &ReactorState, _control: &ControlAction) -> CstrResult<ReactorState> {
        Ok(ReactorState::new(
            self.omega * state.cb(),
            -self.omega * state.ca(),
            0.0,
            0.0,
            0.0,
        ))
    }

    fn name(&self) -> &str {
        "Harmonic Oscillator"
    }
}
