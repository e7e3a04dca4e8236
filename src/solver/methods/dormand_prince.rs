//! Adaptive Dormand–Prince 5(4) solver
//!
//! # Mathematical Background
//!
//! Seven-stage explicit Runge–Kutta pair. The fifth-order solution is
//! propagated, the embedded fourth-order solution only serves to estimate
//! the local error:
//!
//! ```text
//! err_i = h · Σ eⱼ kⱼ,i
//! sc_i  = atol + rtol · max(|y_i|, |ŷ_i|)
//! ‖err‖ = sqrt( mean( (err_i / sc_i)² ) )
//! ```
//!
//! A step is accepted when `‖err‖ ≤ 1`. The next step size is
//! `h · clamp(0.9 · ‖err‖^(−1/5), 0.2, 5)`, never growing right after a
//! rejection.
//!
//! The last stage is evaluated at the accepted point, so it is reused as
//! the first stage of the following step (FSAL).
//!
//! # Characteristics
//!
//! - **Order**: 5 (local error control with order 4)
//! - **Cost**: 6 function evaluations per accepted step
//! - **Default tolerances**: `rtol = atol = 1.49012e-8`
//!
//! # Failure modes
//!
//! A model error at a trial stage (other than the first) is handled as a
//! rejected step. When the step size collapses, the last model error is
//! returned; an exhausted step budget yields
//! [`SimulationError::IntegrationFailed`].

use tracing::{debug, trace, warn};

use crate::error::{CstrResult, SimulationError};
use crate::physics::{ControlAction, PhysicalModel, ReactorState};
use crate::solver::Solver;

// ====== Butcher tableau ======

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// Fifth-order weights (also the last row of A)
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between fifth- and fourth-order weights
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

// ====== Step size control ======

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;
const REJECT_FACTOR: f64 = 0.25;

/// Adaptive Dormand–Prince 5(4) integrator
///
/// # Example
///
/// ```rust
/// use cstr_rs::models::CstrModel;
/// use cstr_rs::physics::{ControlAction, ReactorState};
/// use cstr_rs::solver::{DormandPrinceSolver, Solver};
///
/// let solver = DormandPrinceSolver::default();
/// let next = solver
///     .integrate(
///         &CstrModel::nominal(),
///         &ReactorState::new(0.8, 0.0, 0.0, 325.0, 100.0),
///         &ControlAction::new(300.0, 100.0),
///         1.0,
///     )
///     .unwrap();
///
/// assert!(next.temperature() > 0.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DormandPrinceSolver {
    rtol: f64,
    atol: f64,
    max_steps: usize,
}

/// Outcome of one trial step
struct TrialStep {
    y_new: ReactorState,
    k7: ReactorState,
    error_norm: f64,
}

impl DormandPrinceSolver {
    /// Create a solver with the given tolerances and a budget of 10 000 steps
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            max_steps: 10_000,
        }
    }

    /// Limit accepted plus rejected steps per interval
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn rtol(&self) -> f64 {
        self.rtol
    }

    pub fn atol(&self) -> f64 {
        self.atol
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Weighted RMS norm used for both the error estimate and the initial step
    fn scaled_norm(&self, values: &ReactorState, reference: &ReactorState, other: &ReactorState) -> f64 {
        let n = values.as_vector().len() as f64;
        let sum: f64 = values
            .as_vector()
            .iter()
            .zip(reference.as_vector().iter())
            .zip(other.as_vector().iter())
            .map(|((v, a), b)| {
                let scale = self.atol + self.rtol * a.abs().max(b.abs());
                (v / scale).powi(2)
            })
            .sum();
        (sum / n).sqrt()
    }

    /// Initial step guess from the magnitudes of the state and its slope
    fn initial_step(&self, y: &ReactorState, f0: &ReactorState, dt: f64) -> f64 {
        let d0 = self.scaled_norm(y, y, y);
        let d1 = self.scaled_norm(f0, y, y);

        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };

        h0.min(dt)
    }

    /// Evaluate stages 2..7 and the error estimate for a step of size `h`
    fn trial(
        &self,
        model: &dyn PhysicalModel,
        y: &ReactorState,
        k1: &ReactorState,
        control: &ControlAction,
        h: f64,
    ) -> CstrResult<TrialStep> {
        let y = *y;
        let k1 = *k1;

        let k2 = model.compute_physics(&(y + k1 * (h * A21)), control)?;
        let k3 = model.compute_physics(&(y + (k1 * A31 + k2 * A32) * h), control)?;
        let k4 = model.compute_physics(&(y + (k1 * A41 + k2 * A42 + k3 * A43) * h), control)?;
        let k5 = model.compute_physics(
            &(y + (k1 * A51 + k2 * A52 + k3 * A53 + k4 * A54) * h),
            control,
        )?;
        let k6 = model.compute_physics(
            &(y + (k1 * A61 + k2 * A62 + k3 * A63 + k4 * A64 + k5 * A65) * h),
            control,
        )?;

        let y_new = y + (k1 * B1 + k3 * B3 + k4 * B4 + k5 * B5 + k6 * B6) * h;
        let k7 = model.compute_physics(&y_new, control)?;

        let error = (k1 * E1 + k3 * E3 + k4 * E4 + k5 * E5 + k6 * E6 + k7 * E7) * h;
        let error_norm = self.scaled_norm(&error, &y, &y_new);

        Ok(TrialStep {
            y_new,
            k7,
            error_norm,
        })
    }
}

/// Rejection-heavy intervals are reported at `warn`
fn log_interval(accepted: usize, rejected: usize, dt: f64) {
    if rejected > accepted {
        warn!(accepted, rejected, dt, "Dormand-Prince rejected more steps than it accepted");
    } else {
        debug!(accepted, rejected, dt, "Dormand-Prince interval completed");
    }
}

impl Default for DormandPrinceSolver {
    fn default() -> Self {
        Self::new(1.49012e-8, 1.49012e-8)
    }
}

impl Solver for DormandPrinceSolver {
    fn integrate(
        &self,
        model: &dyn PhysicalModel,
        state: &ReactorState,
        control: &ControlAction,
        dt: f64,
    ) -> CstrResult<ReactorState> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimulationError::configuration(format!(
                "Integration interval must be positive, got {}",
                dt
            )));
        }

        // ====== Step 1: Setup ======

        let mut y = *state;
        let mut k1 = model.compute_physics(&y, control)?;
        let mut h = self.initial_step(&y, &k1, dt);
        let min_step = 1e-12 * dt;

        let mut t = 0.0;
        let mut accepted = 0usize;
        let mut rejected = 0usize;
        let mut last_rejection_error: Option<SimulationError> = None;
        let mut just_rejected = false;

        // ====== Step 2: Adaptive stepping ======

        while t < dt {
            if accepted + rejected >= self.max_steps {
                return Err(SimulationError::IntegrationFailed {
                    reason: format!(
                        "step budget of {} exhausted at t = {:.6} of {} ({} accepted, {} rejected)",
                        self.max_steps, t, dt, accepted, rejected
                    ),
                });
            }

            let remaining = dt - t;
            let is_last = h >= remaining;
            if is_last {
                h = remaining;
            }

            if h < min_step {
                return Err(last_rejection_error.unwrap_or_else(|| {
                    SimulationError::IntegrationFailed {
                        reason: format!("step size underflow (h = {:e}) at t = {:.6}", h, t),
                    }
                }));
            }

            match self.trial(model, &y, &k1, control, h) {
                Ok(step) if step.error_norm <= 1.0 => {
                    // ====== Accepted ======
                    t = if is_last { dt } else { t + h };
                    y = step.y_new;
                    k1 = step.k7;
                    accepted += 1;

                    let factor = if step.error_norm == 0.0 {
                        MAX_FACTOR
                    } else {
                        (SAFETY * step.error_norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                    };
                    h *= if just_rejected { factor.min(1.0) } else { factor };
                    just_rejected = false;
                }
                Ok(step) => {
                    // ====== Rejected: error too large ======
                    rejected += 1;
                    let factor = (SAFETY * step.error_norm.powf(-0.2)).clamp(MIN_FACTOR, 1.0);
                    trace!(t, h, error_norm = step.error_norm, "Dormand-Prince step rejected");
                    h *= factor;
                    just_rejected = true;
                }
                Err(error) => {
                    // ====== Rejected: trial stage left the model domain ======
                    rejected += 1;
                    trace!(t, h, %error, "Dormand-Prince trial stage failed");
                    last_rejection_error = Some(error);
                    h *= REJECT_FACTOR;
                    just_rejected = true;
                }
            }
        }

        log_interval(accepted, rejected, dt);

        Ok(y)
    }

    fn name(&self) -> &'static str {
        "Dormand-Prince (RK45)"
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CstrModel;
    use crate::solver::methods::test_models::{ConstantGrowth, ExponentialDecay, HarmonicOscillator};
    use crate::solver::RK4Solver;
    use approx::assert_relative_eq;

    fn ones() -> ReactorState {
        ReactorState::new(1.0, 1.0, 1.0, 1.0, 1.0)
    }

    #[test]
    fn test_dormand_prince_defaults() {
        let solver = DormandPrinceSolver::default();
        assert_eq!(solver.name(), "Dormand-Prince (RK45)");
        assert_eq!(solver.rtol(), 1.49012e-8);
        assert_eq!(solver.atol(), 1.49012e-8);
        assert_eq!(solver.max_steps(), 10_000);
    }

    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn captured(f: impl FnOnce()) -> String {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);

        let bytes = log.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    const C2: f64 = 1.0 / 5.0;
    const C3: f64 = 3.0 / 10.0;
    const C4: f64 = 4.0 / 5.0;
    const C5: f64 = 8.0 / 9.0;

    #[test]
    fn test_rejection_heavy_interval_warns() {
        let output = captured(|| log_interval(2, 5, 1.0));
        assert!(output.contains("WARN"), "{}", output);
        assert!(output.contains("rejected more steps than it accepted"));

        let output = captured(|| log_interval(5, 2, 1.0));
        assert!(!output.contains("WARN"), "{}", output);
        assert!(output.contains("interval completed"));
    }

    #[test]
    fn test_tableau_rows_are_consistent() {
        // Each row of A sums to its node c
        assert_relative_eq!(A21, C2, epsilon = 1e-15);
        assert_relative_eq!(A31 + A32, C3, epsilon = 1e-15);
        assert_relative_eq!(A41 + A42 + A43, C4, epsilon = 1e-14);
        assert_relative_eq!(A51 + A52 + A53 + A54, C5, epsilon = 1e-13);
        assert_relative_eq!(A61 + A62 + A63 + A64 + A65, 1.0, epsilon = 1e-13);
        assert_relative_eq!(B1 + B3 + B4 + B5 + B6, 1.0, epsilon = 1e-14);
        assert_relative_eq!(E1 + E3 + E4 + E5 + E6 + E7, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_constant_growth_lands_exactly() {
        let model = ConstantGrowth { growth_rate: 3.0 };
        let end = DormandPrinceSolver::default()
            .integrate(&model, &ones(), &ControlAction::new(0.0, 0.0), 2.0)
            .unwrap();
        assert_relative_eq!(end.volume(), 7.0, epsilon = 1e-10);
    }

    #[test]
    fn test_exponential_decay_accuracy() {
        let model = ExponentialDecay { decay_rate: 0.7 };
        let end = DormandPrinceSolver::new(1e-10, 1e-12)
            .integrate(&model, &ones(), &ControlAction::new(0.0, 0.0), 3.0)
            .unwrap();
        assert_relative_eq!(end.ca(), (-2.1_f64).exp(), max_relative = 1e-8);
    }

    #[test]
    fn test_harmonic_oscillator_period() {
        let model = HarmonicOscillator { omega: 2.0 };
        let start = ReactorState::new(1.0, 0.0, 1.0, 1.0, 1.0);
        let end = DormandPrinceSolver::new(1e-10, 1e-10)
            .integrate(&model, &start, &ControlAction::new(0.0, 0.0), std::f64::consts::PI)
            .unwrap();

        assert!((end.ca() - 1.0).abs() < 1e-7);
        assert!(end.cb().abs() < 1e-7);
    }

    #[test]
    fn test_agrees_with_fine_rk4_on_reactor() {
        let model = CstrModel::nominal();
        let start = ReactorState::new(0.8, 0.0, 0.0, 325.0, 100.0);
        let control = ControlAction::new(300.0, 100.0);

        let adaptive = DormandPrinceSolver::default()
            .integrate(&model, &start, &control, 1.0)
            .unwrap();
        let reference = RK4Solver::with_substeps(2000)
            .integrate(&model, &start, &control, 1.0)
            .unwrap();

        for (a, b) in adaptive.to_array().iter().zip(reference.to_array().iter()) {
            assert!((a - b).abs() < 1e-6 * (1.0 + b.abs()), "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_step_budget_exhaustion_fails() {
        let model = ExponentialDecay { decay_rate: 0.1 };
        let result = DormandPrinceSolver::default()
            .with_max_steps(1)
            .integrate(&model, &ones(), &ControlAction::new(0.0, 0.0), 10.0);

        assert!(matches!(result, Err(SimulationError::IntegrationFailed { .. })));
    }

    #[test]
    fn test_invalid_start_state_is_fatal() {
        let model = CstrModel::nominal();
        let empty = ReactorState::new(0.8, 0.0, 0.0, 325.0, 0.0);
        let result = DormandPrinceSolver::default().integrate(
            &model,
            &empty,
            &ControlAction::new(300.0, 100.0),
            1.0,
        );
        assert!(matches!(result, Err(SimulationError::FatalNumerical { .. })));
    }

    #[test]
    fn test_draining_tank_reports_volume_error() {
        // Fin = 0 with Fout = 100 empties a 50 L tank in half a minute
        let model = CstrModel::nominal();
        let start = ReactorState::new(0.8, 0.0, 0.0, 325.0, 50.0);
        let result = DormandPrinceSolver::default().integrate(
            &model,
            &start,
            &ControlAction::new(300.0, 0.0),
            1.0,
        );
        assert!(result.unwrap_err().is_fatal());
    }
}
