//! Plant models
//!
//! All models implement the [`PhysicalModel`](crate::physics::PhysicalModel) trait.
//! The solver calls `compute_physics` at each stage of an integration step;
//! models are responsible for the physics (kinetics, balances), the solver
//! for the time integration.
//!
//! # Available Models
//!
//! ## [`CstrModel`]: continuous stirred-tank reactor
//!
//! Non-isothermal, variable-volume tank with the sequential reactions
//! A → B → C. Manipulated variables are the jacket temperature `Tc` and the
//! inlet flow `Fin`.
//!
//! # Parameters
//!
//! [`ProcessParameters`] holds the five uncertain values (`Tf`, `Caf`, `UA`,
//! `k0_AB`, `k0_BC`); [`ReactorConstants`] holds the ones that never change.

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod cstr;
pub mod parameters;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use cstr::CstrModel;
pub use parameters::{ProcessParameters, ReactorConstants};
