//! Physical models
//!
//! This module provides the vocabulary of the plant: the state and control
//! vectors, the identifiers of their components, and the trait every plant
//! model implements.
//!
//! # Architecture
//!
//! Physical models are **separate from numerical solvers**:
//! - The model provides the **equations** (physics)
//! - The solver provides the **method** to integrate them (numerics)
//!
//! This separation allows the same reactor model to be integrated with
//! Euler, RK4 or an adaptive Dormand–Prince scheme without change.
//!
//! # Example
//!
//! ```rust
//! use cstr_rs::physics::{ControlAction, PhysicalModel, ReactorState};
//! use cstr_rs::models::CstrModel;
//!
//! let model = CstrModel::nominal();
//! let state = ReactorState::new(0.8, 0.0, 0.0, 325.0, 100.0);
//! let control = ControlAction::new(300.0, 100.0);
//!
//! let derivative = model.compute_physics(&state, &control).unwrap();
//! // Inflow equals outflow: the volume is stationary
//! assert_eq!(derivative.volume(), 0.0);
//! ```

// module declaration
pub mod state;
pub mod traits;

// re-export commonly used types for convenience
pub use state::{ControlAction, ReactorState};
pub use traits::{PhysicalModel, StateVariable};
