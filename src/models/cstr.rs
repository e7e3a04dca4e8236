//! Non-isothermal CSTR with two sequential reactions
//!
//! # Model Equations
//!
//! Two irreversible first-order reactions A → B → C with Arrhenius rates:
//!
//! ```text
//! rA = k0_AB · exp(−E_AB/R / T) · Ca
//! rB = k0_BC · exp(−E_BC/R / T) · Cb
//! ```
//!
//! Species, energy and volume balances:
//!
//! ```text
//! dCa/dt = (Fin·Caf − Fout·Ca)/V − rA
//! dCb/dt = rA − rB − Fout·Cb/V
//! dCc/dt = rB − Fout·Cc/V
//! dT/dt  = (Fin/V)(Tf − T) + ΔH_AB/(ρCp)·rA + ΔH_BC/(ρCp)·rB + UA/(VρCp)·(Tc − T)
//! dV/dt  = Fin − Fout
//! ```
//!
//! # Stiffness
//!
//! Around 320–360 K a few kelvin change the reaction rates by tens of
//! percent, and the reaction heat feeds back into temperature. Fixed-step
//! explicit methods need sub-stepping at `dt = 1 min`; the adaptive
//! Dormand–Prince solver handles it directly.
//!
//! # Domain
//!
//! Every balance divides by `V` and the rates are only meaningful for
//! `T > 0`. Both are checked before evaluation and reported as
//! [`SimulationError::FatalNumerical`] rather than producing NaN.

use crate::error::{CstrResult, SimulationError};
use crate::models::parameters::{ProcessParameters, ReactorConstants};
use crate::physics::{ControlAction, PhysicalModel, ReactorState};

/// CSTR plant model
///
/// The same type covers both regimes:
/// - [`CstrModel::nominal`]: fixed, model-assumed parameters (offline analysis)
/// - [`CstrModel::with_parameters`]: uncertain/disturbed parameters supplied
///   by the closed-loop simulator
///
/// # Example
///
/// ```rust
/// use cstr_rs::models::{CstrModel, ProcessParameters};
/// use cstr_rs::physics::{ControlAction, PhysicalModel, ReactorState};
///
/// let mut fouled = ProcessParameters::nominal();
/// fouled.ua *= 0.8;
///
/// let state = ReactorState::new(0.8, 0.0, 0.0, 325.0, 100.0);
/// let control = ControlAction::new(300.0, 100.0);
///
/// let clean = CstrModel::nominal().compute_physics(&state, &control).unwrap();
/// let fouled = CstrModel::with_parameters(fouled).compute_physics(&state, &control).unwrap();
///
/// // Less heat is removed through the jacket
/// assert!(fouled.temperature() > clean.temperature());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CstrModel {
    parameters: ProcessParameters,
    constants: ReactorConstants,
}

impl CstrModel {
    /// Model with nominal parameters
    pub fn nominal() -> Self {
        Self::with_parameters(ProcessParameters::nominal())
    }

    /// Model driven by a specific (uncertain or disturbed) parameter set
    pub fn with_parameters(parameters: ProcessParameters) -> Self {
        Self {
            parameters,
            constants: ReactorConstants::default(),
        }
    }

    /// Override the fixed constants
    pub fn with_constants(mut self, constants: ReactorConstants) -> Self {
        self.constants = constants;
        self
    }

    pub fn parameters(&self) -> &ProcessParameters {
        &self.parameters
    }

    pub fn constants(&self) -> &ReactorConstants {
        &self.constants
    }

    /// Reaction rates `(rA, rB)` at the given state
    #[inline]
    pub fn reaction_rates(&self, state: &ReactorState) -> (f64, f64) {
        let t = state.temperature();
        let r_a = self.parameters.k0_ab * (-self.constants.e_over_r_ab / t).exp() * state.ca();
        let r_b = self.parameters.k0_bc * (-self.constants.e_over_r_bc / t).exp() * state.cb();
        (r_a, r_b)
    }

    fn check_domain(state: &ReactorState) -> CstrResult<()> {
        if let Some((variable, value)) = state.first_non_finite() {
            return Err(SimulationError::fatal(
                0,
                variable.symbol(),
                value,
                "non-finite state passed to the reactor model",
            ));
        }

        let volume = state.volume();
        if volume <= 0.0 {
            return Err(SimulationError::fatal(
                0,
                "V",
                volume,
                "reactor volume must stay positive",
            ));
        }

        let temperature = state.temperature();
        if temperature <= 0.0 {
            return Err(SimulationError::fatal(
                0,
                "T",
                temperature,
                "reactor temperature must stay positive",
            ));
        }

        Ok(())
    }
}

impl Default for CstrModel {
    fn default() -> Self {
        Self::nominal()
    }
}

impl PhysicalModel for CstrModel {
    fn compute_physics(
        &self,
        state: &ReactorState,
        control: &ControlAction,
    ) -> CstrResult<ReactorState> {
        Self::check_domain(state)?;

        let ProcessParameters { tf, caf, ua, .. } = self.parameters;
        let c = &self.constants;

        let tc = control.tc();
        let fin = control.fin();
        let (ca, cb, cc, t, v) = (
            state.ca(),
            state.cb(),
            state.cc(),
            state.temperature(),
            state.volume(),
        );

        let (r_a, r_b) = self.reaction_rates(state);
        let rho_cp = c.heat_capacity();

        // ====== Material balances ======

        let dca = (fin * caf - c.fout * ca) / v - r_a;
        let dcb = r_a - r_b - c.fout * cb / v;
        let dcc = r_b - c.fout * cc / v;

        // ====== Energy balance ======

        let dt = (fin / v) * (tf - t)
            + (c.heat_ab / rho_cp) * r_a
            + (c.heat_bc / rho_cp) * r_b
            + (ua / (v * rho_cp)) * (tc - t);

        // ====== Volume balance ======

        let dv = fin - c.fout;

        let derivative = ReactorState::new(dca, dcb, dcc, dt, dv);

        // exp() overflow or a degenerate control shows up here
        if let Some((variable, value)) = derivative.first_non_finite() {
            return Err(SimulationError::fatal(
                0,
                format!("d{}/dt", variable.symbol()),
                value,
                "non-finite derivative",
            ));
        }

        Ok(derivative)
    }

    fn name(&self) -> &str {
        "CSTR A→B→C"
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn initial_state() -> ReactorState {
        ReactorState::new(0.8, 0.0, 0.0, 325.0, 100.0)
    }

    #[test]
    fn test_derivative_at_initial_state() {
        let model = CstrModel::nominal();
        let control = ControlAction::new(300.0, 100.0);
        let d = model.compute_physics(&initial_state(), &control).unwrap();

        let r_a = 7.2e10 * (-8750.0_f64 / 325.0).exp() * 0.8;

        assert_relative_eq!(d.ca(), (100.0 * 1.0 - 100.0 * 0.8) / 100.0 - r_a, epsilon = 1e-12);
        assert_relative_eq!(d.cb(), r_a, epsilon = 1e-12);
        assert_eq!(d.cc(), 0.0);
        assert_eq!(d.volume(), 0.0);

        let expected_dt = (350.0 - 325.0)
            + (5e3 / 239.0) * r_a
            + (5e4 / (100.0 * 239.0)) * (300.0 - 325.0);
        assert_relative_eq!(d.temperature(), expected_dt, epsilon = 1e-9);
    }

    #[test]
    fn test_volume_derivative_follows_flow_imbalance() {
        let model = CstrModel::nominal();
        let d = model
            .compute_physics(&initial_state(), &ControlAction::new(300.0, 103.0))
            .unwrap();
        assert_relative_eq!(d.volume(), 3.0);
    }

    #[test]
    fn test_parameters_change_derivative() {
        let nominal = CstrModel::nominal();
        let mut hot_feed = ProcessParameters::nominal();
        hot_feed.tf += 10.0;
        let disturbed = CstrModel::with_parameters(hot_feed);

        let control = ControlAction::new(300.0, 100.0);
        let a = nominal.compute_physics(&initial_state(), &control).unwrap();
        let b = disturbed.compute_physics(&initial_state(), &control).unwrap();

        // Fin/V = 1 → +10 K/min in dT/dt, nothing else moves
        assert_relative_eq!(b.temperature() - a.temperature(), 10.0, epsilon = 1e-9);
        assert_eq!(a.ca(), b.ca());
    }

    #[test]
    fn test_zero_volume_is_fatal() {
        let model = CstrModel::nominal();
        let state = ReactorState::new(0.8, 0.0, 0.0, 325.0, 0.0);
        let error = model
            .compute_physics(&state, &ControlAction::new(300.0, 100.0))
            .unwrap_err();

        assert!(error.is_fatal());
        assert!(error.to_string().contains("volume"));
    }

    #[test]
    fn test_negative_temperature_is_fatal() {
        let model = CstrModel::nominal();
        let state = ReactorState::new(0.8, 0.0, 0.0, -1.0, 100.0);
        let result = model.compute_physics(&state, &ControlAction::new(300.0, 100.0));
        assert!(matches!(result, Err(SimulationError::FatalNumerical { .. })));
    }

    #[test]
    fn test_nan_state_is_fatal() {
        let model = CstrModel::nominal();
        let state = ReactorState::new(f64::NAN, 0.0, 0.0, 325.0, 100.0);
        assert!(model
            .compute_physics(&state, &ControlAction::new(300.0, 100.0))
            .is_err());
    }

    #[test]
    fn test_reaction_rates_grow_with_temperature() {
        let model = CstrModel::nominal();
        let cold = ReactorState::new(0.8, 0.2, 0.0, 320.0, 100.0);
        let hot = ReactorState::new(0.8, 0.2, 0.0, 360.0, 100.0);

        let (ra_cold, rb_cold) = model.reaction_rates(&cold);
        let (ra_hot, rb_hot) = model.reaction_rates(&hot);

        assert!(ra_hot > 10.0 * ra_cold);
        // Higher activation energy → steeper response
        assert!(rb_hot / rb_cold > ra_hot / ra_cold);
    }
}
