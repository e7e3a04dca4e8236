//! Numerical solver traits and types
//!
//! # Design Philosophy
//!
//! - Central enum `SolverType` defines which integration method is used
//!   and carries its parameters
//! - `SolverConfiguration` wraps it, validates it and builds the solver
//! - `SimulationResult` stores an open-loop trajectory
//!
//! The closed-loop simulator only ever calls [`Solver::integrate`]: advance
//! the plant by exactly one interval `[0, dt]` under a constant control.
//! [`Solver::solve`] chains those intervals for offline, open-loop runs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CstrResult, SimulationError};
use crate::physics::{ControlAction, PhysicalModel, ReactorState};
use crate::solver::methods::{DormandPrinceSolver, EulerSolver, RK4Solver};
use crate::solver::scenario::Scenario;
use crate::solver::validate_state;

// =================================================================================================
// Solver Trait
// =================================================================================================

/// Trait for numerical integrators
///
/// # Responsibility
///
/// Integrates `dx/dt = f(x, u)` from `t = 0` to `t = dt` with `u` held
/// constant, starting at `state`. The returned state is the value at
/// exactly `t = dt`.
///
/// Implementations propagate model errors unchanged.
pub trait Solver: Send + Sync {
    /// Advance `state` by one interval `dt`
    fn integrate(
        &self,
        model: &dyn PhysicalModel,
        state: &ReactorState,
        control: &ControlAction,
        dt: f64,
    ) -> CstrResult<ReactorState>;

    /// Solver name (used to display and logging)
    fn name(&self) -> &'static str;

    /// Open-loop simulation of a scenario over `time_steps` intervals
    ///
    /// The control of the scenario is held for the whole horizon. Each
    /// interval is integrated with [`Solver::integrate`] and validated.
    fn solve(
        &self,
        scenario: &Scenario,
        total_time: f64,
        time_steps: usize,
    ) -> CstrResult<SimulationResult> {
        // ====== Step 1: Validation ======

        if !(total_time.is_finite() && total_time > 0.0) {
            return Err(SimulationError::configuration(format!(
                "Total time must be positive, got {}",
                total_time
            )));
        }
        if time_steps == 0 {
            return Err(SimulationError::configuration(
                "TimeSteps must be greater than 0",
            ));
        }

        // ====== Step 2: Setup ======

        let dt = total_time / (time_steps as f64);
        let mut state = scenario.initial_state;

        let mut time_points = Vec::with_capacity(time_steps + 1);
        let mut state_trajectory = Vec::with_capacity(time_steps + 1);

        time_points.push(0.0);
        state_trajectory.push(state);

        // ====== Step 3: Time Integration ======

        for step in 0..time_steps {
            state = self
                .integrate(scenario.model.as_ref(), &state, &scenario.control, dt)
                .map_err(|error| error.at_step(step + 1))?;

            validate_state(&state, step + 1)?;

            state_trajectory.push(state);

            // Computed from the index so that the last point is exactly total_time
            time_points.push((step as f64 + 1.0) * dt);
        }

        // ====== Step 4: Build Result ======

        let mut result = SimulationResult::new(time_points, state_trajectory, state);
        result.add_metadata("solver", self.name());
        result.add_metadata("model", scenario.model.name());
        result.add_metadata("time steps", &time_steps.to_string());
        result.add_metadata("dt", &dt.to_string());

        Ok(result)
    }
}

// =================================================================================================
// Central Solver Type Enumeration
// =================================================================================================

/// Integration method and its parameters
///
/// # Examples
///
/// ```rust
/// use cstr_rs::solver::SolverType;
///
/// let fixed = SolverType::RungeKutta4 { substeps: 20 };
/// assert!(fixed.validate().is_ok());
///
/// let adaptive = SolverType::default();
/// assert_eq!(adaptive.name(), "DormandPrince");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SolverType {
    /// Forward Euler with `substeps` equal sub-intervals per `dt`
    Euler { substeps: usize },

    /// Classical RK4 with `substeps` equal sub-intervals per `dt`
    RungeKutta4 { substeps: usize },

    /// Adaptive Dormand–Prince 5(4) with mixed error control
    ///
    /// # Parameters
    /// - `rtol`: relative tolerance
    /// - `atol`: absolute tolerance
    /// - `max_steps`: accepted + rejected step budget per interval
    DormandPrince {
        rtol: f64,
        atol: f64,
        max_steps: usize,
    },
}

impl Default for SolverType {
    fn default() -> Self {
        SolverType::DormandPrince {
            rtol: 1.49012e-8,
            atol: 1.49012e-8,
            max_steps: 10_000,
        }
    }
}

impl SolverType {
    /// Get name identifier
    pub fn name(&self) -> &str {
        match self {
            SolverType::Euler { .. } => "Euler",
            SolverType::RungeKutta4 { .. } => "RungeKutta4",
            SolverType::DormandPrince { .. } => "DormandPrince",
        }
    }

    /// Validate that parameters are numerically meaningful
    pub fn validate(&self) -> CstrResult<()> {
        match self {
            SolverType::Euler { substeps } | SolverType::RungeKutta4 { substeps } => {
                if *substeps == 0 {
                    return Err(SimulationError::configuration(
                        "Substeps must be greater than 0",
                    ));
                }
                Ok(())
            }
            SolverType::DormandPrince { rtol, atol, max_steps } => {
                if !(rtol.is_finite() && *rtol > 0.0) {
                    return Err(SimulationError::configuration(
                        "Relative tolerance must be positive",
                    ));
                }
                if !(atol.is_finite() && *atol > 0.0) {
                    return Err(SimulationError::configuration(
                        "Absolute tolerance must be positive",
                    ));
                }
                if *max_steps == 0 {
                    return Err(SimulationError::configuration(
                        "Maximum steps must be positive",
                    ));
                }
                Ok(())
            }
        }
    }
}

// =================================================================================================
// Solver configuration
// =================================================================================================

/// Configuration for the numerical solver
///
/// # Examples
///
/// ```rust
/// use cstr_rs::solver::SolverConfiguration;
///
/// let config = SolverConfiguration::runge_kutta4(50);
/// let solver = config.build().unwrap();
/// assert_eq!(solver.name(), "Runge Kutta (RK4)");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverConfiguration {
    /// Type of solver and its parameters
    pub solver_type: SolverType,
}

impl SolverConfiguration {
    /// Create a new configuration with a given solver type
    pub fn new(solver_type: SolverType) -> Self {
        Self { solver_type }
    }

    /// Forward Euler configuration
    pub fn euler(substeps: usize) -> Self {
        Self::new(SolverType::Euler { substeps })
    }

    /// Fixed-step RK4 configuration
    pub fn runge_kutta4(substeps: usize) -> Self {
        Self::new(SolverType::RungeKutta4 { substeps })
    }

    /// Adaptive Dormand–Prince configuration
    pub fn dormand_prince(rtol: f64, atol: f64) -> Self {
        Self::new(SolverType::DormandPrince {
            rtol,
            atol,
            max_steps: 10_000,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> CstrResult<()> {
        self.solver_type.validate()
    }

    /// Validate and instantiate the configured solver
    pub fn build(&self) -> CstrResult<Box<dyn Solver>> {
        self.validate()?;

        let solver: Box<dyn Solver> = match self.solver_type {
            SolverType::Euler { substeps } => Box::new(EulerSolver::with_substeps(substeps)),
            SolverType::RungeKutta4 { substeps } => Box::new(RK4Solver::with_substeps(substeps)),
            SolverType::DormandPrince { rtol, atol, max_steps } => {
                Box::new(DormandPrinceSolver::new(rtol, atol).with_max_steps(max_steps))
            }
        };

        Ok(solver)
    }
}

// =================================================================================================
// Simulation result
// =================================================================================================

/// Open-loop trajectory produced by [`Solver::solve`]
#[derive(Clone, Debug)]
pub struct SimulationResult {
    /// Time points, starting at 0
    pub time_points: Vec<f64>,

    /// State at each time point
    pub state_trajectory: Vec<ReactorState>,

    /// State at the last time point
    pub final_state: ReactorState,

    /// Free-form information (solver name, dt, ...)
    pub metadata: HashMap<String, String>,
}

impl SimulationResult {
    pub fn new(
        time_points: Vec<f64>,
        state_trajectory: Vec<ReactorState>,
        final_state: ReactorState,
    ) -> Self {
        Self {
            time_points,
            state_trajectory,
            final_state,
            metadata: HashMap::new(),
        }
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Number of stored points
    pub fn len(&self) -> usize {
        self.time_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_points.is_empty()
    }
}

// =================================================================================================
// Tests
// =================================================================================================
