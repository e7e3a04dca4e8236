//! Runge-Kutta 4 (RK4) numerical solver
//!
//! # Mathematical Background
//!
//! The classical fourth-order Runge-Kutta method uses a weighted average of
//! four slope estimates over a sub-step `h`:
//!
//! ```text
//! k₁ = f(yₙ)
//! k₂ = f(yₙ + h/2 · k₁)
//! k₃ = f(yₙ + h/2 · k₂)
//! k₄ = f(yₙ + h · k₃)
//!
//! yₙ₊₁ = yₙ + h/6 · (k₁ + 2k₂ + 2k₃ + k₄)
//! ```
//!
//! The control is held constant over the interval, so no explicit time
//! dependence enters the stages.
//!
//! # Characteristics
//!
//! - **Order**: fourth-order accurate (global error O(h⁴))
//! - **Stability**: real-axis stability limit |λh| ≈ 2.78
//! - **Cost**: 4 function evaluations per sub-step
//!
//! # Sub-stepping on the CSTR
//!
//! With `dt = 1 min`, the fastest CSTR modes sit near the RK4 stability
//! limit. About 20 sub-steps per interval keep the scheme well inside it.

use crate::error::{CstrResult, SimulationError};
use crate::physics::{ControlAction, PhysicalModel, ReactorState};
use crate::solver::Solver;

// =================================================================================================
// RK4 Solver
// =================================================================================================

/// Classical fourth-order Runge-Kutta solver with fixed sub-stepping
///
/// # Example
///
/// ```rust
/// use cstr_rs::models::CstrModel;
/// use cstr_rs::physics::{ControlAction, ReactorState};
/// use cstr_rs::solver::{RK4Solver, Solver};
///
/// let solver = RK4Solver::with_substeps(20);
/// let next = solver
///     .integrate(
///         &CstrModel::nominal(),
///         &ReactorState::new(0.8, 0.0, 0.0, 325.0, 100.0),
///         &ControlAction::new(300.0, 100.0),
///         1.0,
///     )
///     .unwrap();
///
/// // Some A has already turned into B
/// assert!(next.cb() > 0.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RK4Solver {
    substeps: usize,
}

impl RK4Solver {
    /// Create a new RK4 solver with the default 20 sub-steps
    pub fn new() -> Self {
        Self { substeps: 20 }
    }

    /// Create a solver splitting each interval into `substeps` steps
    ///
    /// A value of 0 is raised to 1.
    pub fn with_substeps(substeps: usize) -> Self {
        Self {
            substeps: substeps.max(1),
        }
    }

    pub fn substeps(&self) -> usize {
        self.substeps
    }

    /// One RK4 step of size `h`
    pub(crate) fn step(
        model: &dyn PhysicalModel,
        y: &ReactorState,
        control: &ControlAction,
        h: f64,
    ) -> CstrResult<ReactorState> {
        // Stage 1: slope at beginning of sub-step
        let k1 = model.compute_physics(y, control)?;

        // Stage 2: slope at midpoint using Euler prediction with k₁
        let k2 = model.compute_physics(&(*y + k1 * (h / 2.0)), control)?;

        // Stage 3: slope at midpoint using Euler prediction with k₂
        let k3 = model.compute_physics(&(*y + k2 * (h / 2.0)), control)?;

        // Stage 4: slope at end using Euler prediction with k₃
        let k4 = model.compute_physics(&(*y + k3 * h), control)?;

        // Simpson weights: 1/6 at the endpoints, 1/3 at the midpoints
        let weighted_slope = k1 + k2 * 2.0 + k3 * 2.0 + k4;

        Ok(*y + weighted_slope * (h / 6.0))
    }
}

impl Default for RK4Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for RK4Solver {
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

        let h = dt / self.substeps as f64;
        let mut y = *state;

        for _ in 0..self.substeps {
            y = Self::step(model, &y, control, h)?;
        }

        Ok(y)
    }

    fn name(&self) -> &'static str {
        "Runge Kutta (RK4)"
    }
}

// =================================================================================================
// Tests
// =================================================================================================
