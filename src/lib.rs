//! cstr-rs: Closed-Loop CSTR Simulation
//!
//! A stochastic simulation environment for a continuous stirred-tank
//! reactor regulated by a velocity-form PID controller. An agent chooses
//! the six PID gains at every control interval; the environment applies
//! them through an actuator delay, integrates the plant, corrupts the
//! measurement with noise and transport delay, and returns a reward.
//!
//! # Architecture
//!
//! 1. **Separation of Physics and Numerics**
//!    - The reactor model defines the equations ([`models::CstrModel`])
//!    - Numerical solvers integrate them ([`solver`])
//!
//! 2. **Separation of Control and Environment**
//!    - [`control`]: gain scaling, clamping, the incremental PID law
//!    - [`environment`]: delays, noise, disturbances and the step/reset loop
//!
//! 3. **Collaborators at the edge**
//!    - [`output`]: figures and CSV export of the episode log
//!    - [`rollout`]: batch evaluation of seeded episodes
//!
//! # Quick Start
//!
//! ```rust
//! use cstr_rs::prelude::*;
//!
//! # fn main() -> Result<(), SimulationError> {
//! // 1. Configure the environment
//! let config = EnvironmentConfig {
//!     simulation_steps: 10,
//!     solver: SolverType::RungeKutta4 { substeps: 50 },
//!     ..EnvironmentConfig::default()
//! };
//!
//! // 2. Start a seeded episode
//! let mut env = ClosedLoopSimulator::with_seed(config, 42)?;
//! let (observation, _) = env.reset(Some(42));
//! assert_eq!(observation.setpoint_cb(), 0.70);
//!
//! // 3. Run it with mid-range gains
//! loop {
//!     let result = env.step(&[0.0; ACTION_DIM])?;
//!     assert!(result.reward <= 0.0);
//!     if result.done {
//!         break;
//!     }
//! }
//!
//! // 4. Inspect the log
//! assert_eq!(env.log().len(), 11);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`physics`]: State vectors and the model trait
//! - [`models`]: The CSTR model and its parameters
//! - [`solver`]: Euler, RK4 and Dormand–Prince integrators
//! - [`control`]: PID gains, limits and controller
//! - [`environment`]: Closed-loop simulator
//! - [`rollout`]: Seeded batch evaluation
//! - [`output`]: Visualization and export

pub mod error;

// Core modules
pub mod physics;

pub mod models;
pub mod solver;

pub mod control;
pub mod environment;

pub mod output;
pub mod rollout;

pub use error::{CstrResult, SimulationError};

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use cstr_rs::prelude::*;
    //! ```
    pub use crate::control::{GainScaling, LoopGains, PidGains, ACTION_DIM};
    pub use crate::environment::{
        ClosedLoopSimulator, Disturbance, Environment, EnvironmentConfig, Observation,
        StepResult,
    };
    pub use crate::error::{CstrResult, SimulationError};
    pub use crate::models::{CstrModel, ProcessParameters};
    pub use crate::physics::{ControlAction, PhysicalModel, ReactorState};
    pub use crate::rollout::{run_batch, run_episode, ConstantPolicy, Policy};
    pub use crate::solver::{
        DormandPrinceSolver, EulerSolver, RK4Solver, Solver, SolverConfiguration, SolverType,
    };
}
