//! Forward Euler solver
//!
//! # Mathematical Background
//!
//! ```text
//! yₙ₊₁ = yₙ + h · f(yₙ, u)
//! ```
//!
//! One interval `dt` is split into `substeps` equal sub-steps `h = dt / substeps`.
//!
//! # Characteristics
//!
//! - **Order**: first-order accurate (global error O(h))
//! - **Stability**: conditionally stable, needs small `h` on the CSTR
//! - **Cost**: 1 function evaluation per sub-step
//!
//! Mostly useful as a baseline in tests and benchmarks.

use crate::error::{CstrResult, SimulationError};
use crate::physics::{ControlAction, PhysicalModel, ReactorState};
use crate::solver::Solver;

/// Forward Euler with fixed sub-stepping
///
/// # Example
///
/// ```rust
/// use cstr_rs::solver::{EulerSolver, Solver};
///
/// let solver = EulerSolver::with_substeps(200);
/// assert_eq!(solver.name(), "Forward Euler");
/// assert_eq!(solver.substeps(), 200);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EulerSolver {
    substeps: usize,
}

impl EulerSolver {
    /// Create a solver with a single step per interval
    pub fn new() -> Self {
        Self { substeps: 1 }
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
}

impl Default for EulerSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for EulerSolver {
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

        // yₙ₊₁ = yₙ + h·f(yₙ)
        for _ in 0..self.substeps {
            let slope = model.compute_physics(&y, control)?;
            y = y + slope * h;
        }

        Ok(y)
    }

    fn name(&self) -> &'static str {
        "Forward Euler"
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::methods::test_models::{ConstantGrowth, ExponentialDecay};
    use crate::solver::Scenario;

    #[test]
    fn test_euler_solver_creation() {
        let solver = EulerSolver::new();
        assert_eq!(solver.name(), "Forward Euler");
        assert_eq!(solver.substeps(), 1);
        assert_eq!(EulerSolver::with_substeps(0).substeps(), 1);
    }

    #[test]
    fn test_euler_exact_for_constant_growth() {
        let model = ConstantGrowth { growth_rate: 2.0 };
        let start = ReactorState::new(1.0, 1.0, 1.0, 1.0, 1.0);

        let end = EulerSolver::with_substeps(10)
            .integrate(&model, &start, &ControlAction::new(0.0, 0.0), 5.0)
            .unwrap();

        for value in end.to_array() {
            assert!((value - 11.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_euler_first_order_convergence() {
        let model = ExponentialDecay { decay_rate: 0.5 };
        let start = ReactorState::new(1.0, 1.0, 1.0, 1.0, 1.0);
        let exact = (-0.5_f64 * 2.0).exp();

        let errors: Vec<f64> = [100, 200, 400]
            .iter()
            .map(|&n| {
                let end = EulerSolver::with_substeps(n)
                    .integrate(&model, &start, &ControlAction::new(0.0, 0.0), 2.0)
                    .unwrap();
                (end.ca() - exact).abs()
            })
            .collect();

        for pair in errors.windows(2) {
            let ratio = pair[0] / pair[1];
            assert!(ratio > 1.8 && ratio < 2.2, "ratio {} is not first order", ratio);
        }
    }

    #[test]
    fn test_euler_rejects_non_positive_interval() {
        let model = ConstantGrowth { growth_rate: 1.0 };
        let start = ReactorState::new(1.0, 1.0, 1.0, 1.0, 1.0);
        let result = EulerSolver::new().integrate(&model, &start, &ControlAction::new(0.0, 0.0), 0.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_euler_solve_builds_trajectory() {
        let scenario = Scenario::new(
            Box::new(ExponentialDecay { decay_rate: 0.1 }),
            ReactorState::new(1.0, 1.0, 1.0, 1.0, 1.0),
            ControlAction::new(0.0, 0.0),
        );

        let result = EulerSolver::with_substeps(10).solve(&scenario, 10.0, 100).unwrap();

        assert_eq!(result.len(), 101);
        assert!((result.time_points[100] - 10.0).abs() < 1e-12);
        assert_eq!(result.metadata.get("solver").map(String::as_str), Some("Forward Euler"));
    }
}
