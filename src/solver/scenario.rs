//! Open-loop simulation scenario
//!
//! A scenario combines a plant model with an initial state and a control
//! held constant over the horizon.
use crate::physics::{ControlAction, PhysicalModel, ReactorState};

/// Open-loop simulation scenario
///
/// Defines a specific case to simulate:
/// - Physical model (equations)
/// - Initial state
/// - Constant control
///
/// # Design
///
/// The same scenario can be solved with different numerical methods.
/// This is the "WHAT to solve" (not "HOW to solve").
///
/// # Examples
///
/// ```rust
/// use cstr_rs::models::CstrModel;
/// use cstr_rs::physics::{ControlAction, ReactorState};
/// use cstr_rs::solver::{RK4Solver, Scenario, Solver};
///
/// let scenario = Scenario::new(
///     Box::new(CstrModel::nominal()),
///     ReactorState::new(0.8, 0.0, 0.0, 325.0, 100.0),
///     ControlAction::new(300.0, 100.0),
/// );
///
/// let result = RK4Solver::with_substeps(50).solve(&scenario, 10.0, 10).unwrap();
/// assert_eq!(result.len(), 11);
/// ```
pub struct Scenario {
    /// Physical model (equations)
    pub model: Box<dyn PhysicalModel>,

    /// State at t = 0
    pub initial_state: ReactorState,

    /// Control applied over the whole horizon
    pub control: ControlAction,
}

impl Scenario {
    /// Create a scenario
    pub fn new(
        model: Box<dyn PhysicalModel>,
        initial_state: ReactorState,
        control: ControlAction,
    ) -> Self {
        Self {
            model,
            initial_state,
            control,
        }
    }

    /// Get model name
    pub fn get_model_name(&self) -> &str {
        self.model.name()
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.get_model_name())
            .field("initial state", &self.initial_state)
            .field("control", &self.control)
            .finish()
    }
}

// ================================================================================================
// Tests
// ================================================================================================
