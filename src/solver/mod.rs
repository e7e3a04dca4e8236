//! Numerical solvers
//!
//! This module provides traits and implementations for numerical solvers.
//! A numerical solver applies a numerical method to the equations provided
//! by a physical model.
//!
//! # Core Concepts
//!
//! ## The Architecture (WHAT vs HOW)
//!
//! 1. **Model** (`PhysicalModel`) - the equations
//!    - `dx/dt = f(x, u)` for the five reactor states
//!
//! 2. **Configuration** (`SolverConfiguration`) - HOW to solve
//!    - Method selection (Euler, RK4, Dormand–Prince)
//!    - Numerical parameters (sub-steps, tolerances, step budget)
//!
//! 3. **Solver** (`Solver` trait) - the numerical method
//!    - [`Solver::integrate`]: one interval under a constant control
//!    - [`Solver::solve`]: an open-loop [`Scenario`] over many intervals
//!
//! # Module Organization
//!
//! - **`traits`**: `Solver`, `SolverType`, `SolverConfiguration`, `SimulationResult`
//! - **`scenario`**: `Scenario` (model + initial state + constant control)
//! - **`methods`**: `EulerSolver`, `RK4Solver`, `DormandPrinceSolver`
//!
//! # Quick Start Example
//!
//! ```rust
//! use cstr_rs::models::CstrModel;
//! use cstr_rs::physics::{ControlAction, ReactorState};
//! use cstr_rs::solver::{Scenario, SolverConfiguration};
//!
//! // 1. WHAT to solve
//! let scenario = Scenario::new(
//!     Box::new(CstrModel::nominal()),
//!     ReactorState::new(0.8, 0.0, 0.0, 325.0, 100.0),
//!     ControlAction::new(300.0, 100.0),
//! );
//!
//! // 2. HOW to solve
//! let solver = SolverConfiguration::default().build().unwrap();
//!
//! // 3. Solve 30 minutes, one point per minute
//! let result = solver.solve(&scenario, 30.0, 30).unwrap();
//! assert_eq!(result.len(), 31);
//! assert!(result.final_state.cc() > 0.0);
//! ```
//!
//! # Error Handling
//!
//! All solver methods return [`CstrResult`]. Common errors:
//! - Invalid configuration (non-positive interval, zero sub-steps)
//! - Plant outside its domain ([`SimulationError::FatalNumerical`])
//! - Step budget exhausted ([`SimulationError::IntegrationFailed`])

// =================================================================================================
// Module Declarations
// =================================================================================================

mod scenario;
mod traits;

pub mod methods;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use traits::{SimulationResult, Solver, SolverConfiguration, SolverType};

pub use scenario::Scenario;

pub use methods::{DormandPrinceSolver, EulerSolver, RK4Solver};

// =================================================================================================
// Helper Functions
// =================================================================================================

use crate::error::{CstrResult, SimulationError};
use crate::physics::ReactorState;

/// Validate an integrated state for numerical issues
///
/// Rejects NaN/Inf in any component, and a non-positive volume or
/// temperature. Any of these would poison every later history entry.
///
/// # Arguments
///
/// * `state` - State to validate
/// * `step` - Simulation step (for error reporting)
pub(crate) fn validate_state(state: &ReactorState, step: usize) -> CstrResult<()> {
    // NaN can arise from 0/0, Inf from exp() overflow
    if let Some((variable, value)) = state.first_non_finite() {
        return Err(SimulationError::fatal(
            step,
            variable.symbol(),
            value,
            "non-finite value after integration",
        ));
    }

    if state.volume() <= 0.0 {
        return Err(SimulationError::fatal(
            step,
            "V",
            state.volume(),
            "reactor volume must stay positive",
        ));
    }

    if state.temperature() <= 0.0 {
        return Err(SimulationError::fatal(
            step,
            "T",
            state.temperature(),
            "reactor temperature must stay positive",
        ));
    }

    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_state_accepts_physical_state() {
        let state = ReactorState::new(0.8, 0.0, 0.0, 325.0, 100.0);
        assert!(validate_state(&state, 3).is_ok());
    }

    #[test]
    fn test_validate_state_reports_nan() {
        let state = ReactorState::new(0.8, f64::NAN, 0.0, 325.0, 100.0);
        let error = validate_state(&state, 7).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("step 7"));
        assert!(message.contains("Cb"));
    }

    #[test]
    fn test_validate_state_reports_infinity() {
        let state = ReactorState::new(0.8, 0.0, 0.0, f64::INFINITY, 100.0);
        assert!(validate_state(&state, 0).unwrap_err().is_fatal());
    }

    #[test]
    fn test_validate_state_rejects_empty_tank() {
        let state = ReactorState::new(0.8, 0.0, 0.0, 325.0, -0.1);
        match validate_state(&state, 12) {
            Err(SimulationError::FatalNumerical { step, variable, .. }) => {
                assert_eq!(step, 12);
                assert_eq!(variable, "V");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_negative_concentration_is_not_fatal() {
        // Only V and T carry a physical domain constraint
        let state = ReactorState::new(-1e-6, 0.0, 0.0, 325.0, 100.0);
        assert!(validate_state(&state, 1).is_ok());
    }
}
